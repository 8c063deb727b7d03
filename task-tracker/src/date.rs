use crate::error::DateError;
use chrono::NaiveDate;

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Input layouts accepted by [`parse_date`], tried in order.
///
/// Month-first layouts win over day-first ones, so `01-02-2025` is read as
/// January 2nd.
const INPUT_FORMATS: [&str; 9] = [
    "%m-%d-%Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%b-%d-%Y",
    "%Y-%b-%d",
];

/// Strict gate for due dates entered on the command line: `YYYY-MM-DD` only.
pub fn validate_due_date(text: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(text, DUE_DATE_FORMAT).map_err(|_| DateError::Invalid(text.into()))
}

/// Lenient date parser normalizing several common layouts to `YYYY-MM-DD`.
///
/// Blank input is `Ok(None)`, which callers treat as "no date" rather than an
/// error.
pub fn parse_date(text: &str) -> Result<Option<String>, DateError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|date| Some(date.format(DUE_DATE_FORMAT).to_string()))
        .ok_or_else(|| DateError::Invalid(text.into()))
}
