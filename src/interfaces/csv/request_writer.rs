use crate::application::stats::{LeaveStats, LeaveSummary};
use crate::domain::leave::LeaveRequest;
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// Printed instead of a table when a listing is empty.
pub const NO_MATCHES: &str = "No matching requests.";

#[derive(Serialize)]
struct RequestRow<'a> {
    id: u64,
    requester: &'a str,
    department: &'a str,
    category: &'a str,
    start: String,
    end: String,
    days: u32,
    status: &'a str,
    steps: String,
}

impl<'a> From<&'a LeaveRequest> for RequestRow<'a> {
    fn from(r: &'a LeaveRequest) -> Self {
        Self {
            id: r.id,
            requester: &r.requester,
            department: &r.department,
            category: r.category.as_str(),
            start: r.start.to_string(),
            end: r.end.to_string(),
            days: r.days,
            status: r.status().as_str(),
            steps: r.step_summary(),
        }
    }
}

/// Writes leave requests as CSV.
pub struct RequestWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RequestWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(sink),
        }
    }

    /// Header plus one row per request, or [`NO_MATCHES`] when empty.
    pub fn write_requests(&mut self, requests: &[LeaveRequest]) -> Result<()> {
        if requests.is_empty() {
            self.writer.write_record([NO_MATCHES])?;
        } else {
            for request in requests {
                self.writer.serialize(RequestRow::from(request))?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    /// A single `name,value` row, appended after a listing.
    pub fn write_metric(&mut self, name: &str, value: impl fmt::Display) -> Result<()> {
        self.writer.write_record([name, value.to_string().as_str()])?;
        self.writer.flush()?;
        Ok(())
    }

    /// `requests,N` and `approved_days,N` for a requester's own listing.
    pub fn write_summary(&mut self, summary: &LeaveSummary) -> Result<()> {
        self.write_metric("requests", summary.count)?;
        self.write_metric("approved_days", summary.approved_days)
    }

    /// `metric,key,value` rows: the total, one per category, one per
    /// requester with approved days.
    pub fn write_stats(&mut self, stats: &LeaveStats) -> Result<()> {
        self.writer.write_record(["metric", "key", "value"])?;
        self.writer
            .write_record(["total", "", stats.total.to_string().as_str()])?;
        for (category, count) in &stats.by_category {
            self.writer
                .write_record(["category", category.as_str(), count.to_string().as_str()])?;
        }
        for (requester, days) in &stats.approved_days {
            self.writer
                .write_record(["approved_days", requester.as_str(), days.to_string().as_str()])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
