use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use models::DateInput;

use crate::errors::ServiceError;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a submitted date. Naive timestamps and bare dates are taken as UTC.
pub fn parse_date(input: &DateInput) -> Option<DateTime<Utc>> {
    match input {
        DateInput::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
        DateInput::Text(raw) => {
            let s = raw.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Some(dt) = NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            {
                return Some(dt.and_utc());
            }
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
            }
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                return s.parse::<i64>().ok().and_then(|ms| Utc.timestamp_millis_opt(ms).single());
            }
            None
        }
    }
}

/// Canonical stored form: RFC 3339, UTC, millisecond precision, `Z` suffix.
pub fn canonical(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Normalize a date-bearing field or reject it with the field name.
pub fn normalize(field: &str, input: Option<&DateInput>) -> Result<String, ServiceError> {
    let input = input.ok_or_else(|| ServiceError::Validation(format!("{field}: missing date")))?;
    parse_date(input)
        .map(|dt| canonical(&dt))
        .ok_or_else(|| ServiceError::Validation(format!("{field}: unrecognised date {input:?}")))
}
