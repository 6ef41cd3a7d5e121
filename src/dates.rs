//! Date strings as printed on the forms.
//!
//! Conversion is plain string surgery on `YYYY-MM-DD`. Parsing into a
//! timezone-aware date and formatting back can shift the day, so no date
//! type is involved here.

/// Printed where a date is missing.
pub const BLANK_DATE: &str = "___/___/______";

/// `2025-03-05` or `2025-03-05T10:00:00Z` → `05/03/2025`.
///
/// Returns `None` when the input is not three dash-separated parts.
pub fn format_iso_date(iso: &str) -> Option<String> {
    let date = iso.trim().split('T').next().unwrap_or_default();
    let mut parts = date.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || [year, month, day].iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(format!("{}/{}/{}", day, month, year))
}

/// Date as it should appear on the page: formatted, blank placeholder for
/// empty input, or the raw string when it cannot be split.
pub fn display_date(iso: &str) -> String {
    if iso.trim().is_empty() {
        return BLANK_DATE.to_string();
    }
    format_iso_date(iso).unwrap_or_else(|| iso.to_string())
}
