use crate::domain::approval::AggregateStatus;
use crate::domain::leave::{LeaveCategory, LeaveRequest};
use std::collections::{BTreeMap, HashMap};

/// Totals shown to a requester over their own requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeaveSummary {
    pub count: usize,
    pub approved_days: u32,
}

impl LeaveSummary {
    pub fn collect(requests: &[LeaveRequest]) -> Self {
        Self {
            count: requests.len(),
            approved_days: requests
                .iter()
                .filter(|r| r.status() == AggregateStatus::Approved)
                .map(|r| r.days)
                .sum(),
        }
    }
}

/// Organization-wide figures for HR.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeaveStats {
    pub total: usize,
    pub by_category: BTreeMap<LeaveCategory, usize>,
    /// Approved days per requester, most days first, ties by name.
    pub approved_days: Vec<(String, u32)>,
}

impl LeaveStats {
    pub fn collect(requests: &[LeaveRequest]) -> Self {
        let mut by_category = BTreeMap::new();
        let mut days: HashMap<&str, u32> = HashMap::new();

        for request in requests {
            *by_category.entry(request.category).or_insert(0) += 1;
            if request.status() == AggregateStatus::Approved {
                *days.entry(request.requester.as_str()).or_insert(0) += request.days;
            }
        }

        let mut approved_days: Vec<(String, u32)> = days
            .into_iter()
            .map(|(name, d)| (name.to_string(), d))
            .collect();
        approved_days.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            total: requests.len(),
            by_category,
            approved_days,
        }
    }
}
