//! Assignment code generation
//!
//! Codes look like `PA230501JK0001`: the `PA` tag, the assignment date as
//! YYMMDD, the two-letter branch code, and a four-digit per-branch-per-day
//! sequence. The sequence continues from the lexicographically greatest
//! existing code with the same prefix.

use chrono::NaiveDate;

/// Prefix shared by all codes for one branch and day
pub fn code_prefix(branch_code: &str, date: NaiveDate) -> String {
    format!("PA{}{}", date.format("%y%m%d"), branch_code)
}

/// Build the next code after `latest_code` (or the first of the day)
pub fn next_code(branch_code: &str, date: NaiveDate, latest_code: Option<&str>) -> String {
    let prefix = code_prefix(branch_code, date);

    let next_sequence = latest_code
        .and_then(|code| code.strip_prefix(&prefix))
        .and_then(|suffix| suffix.parse::<u32>().ok())
        .map(|seq| seq + 1)
        .unwrap_or(1);

    format!("{}{:04}", prefix, next_sequence)
}
