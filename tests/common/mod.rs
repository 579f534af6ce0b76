use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 12] = [
    "action",
    "actor",
    "request",
    "role",
    "step",
    "status",
    "category",
    "department",
    "start",
    "end",
    "reason",
    "attachment",
];

const CATEGORIES: [&str; 4] = ["sick", "personal", "vacation", "other"];

/// Requester, department and the `(actor, role)` chain that decides them,
/// matching the stock sample users.
const REQUESTERS: [(&str, &str, &[(&str, &str)]); 2] = [
    (
        "bob",
        "Academic",
        &[("mentor_lee", "mentor"), ("sup_acad", "supervisor"), ("hr_officer", "hr")],
    ),
    (
        "alice",
        "Planetarium",
        &[("sup_tk", "supervisor"), ("hr_officer", "hr")],
    ),
];

/// Writes a script of `requests` random submissions, each followed by a
/// random run of approve/reject decisions along its chain.
pub fn generate_script(path: &Path, requests: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    let mut rng = rand::thread_rng();
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    wtr.write_record(HEADER)?;

    for id in 1..=requests {
        let &(requester, department, chain) = REQUESTERS.choose(&mut rng).unwrap();
        let category = *CATEGORIES.choose(&mut rng).unwrap();
        let start = base + Days::new(rng.gen_range(0..300));
        let end = start + Days::new(rng.gen_range(0..5));
        let (start, end) = (start.to_string(), end.to_string());

        wtr.write_record([
            "submit",
            requester,
            "",
            "",
            "",
            "",
            category,
            department,
            start.as_str(),
            end.as_str(),
            "generated",
            "",
        ])?;

        let id = id.to_string();
        let decided = rng.gen_range(0..=chain.len());
        for &(actor, role) in chain.iter().take(decided) {
            let action = if rng.gen_bool(0.8) { "approve" } else { "reject" };
            wtr.write_record([action, actor, id.as_str(), role, "", "", "", "", "", "", "", ""])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
