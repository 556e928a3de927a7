use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse the date formats the submission form and API produce.
pub fn parse_report_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(input, "%Y/%m/%d").ok())
}

/// Format a report date as `DD Mon YYYY`, e.g. `05 Aug 2025`.
///
/// Empty or unparseable input yields an empty string.
pub fn format_date_dd_mmm_yyyy(input: &str) -> String {
    parse_report_date(input)
        .map(|date| date.format("%d %b %Y").to_string())
        .unwrap_or_default()
}
