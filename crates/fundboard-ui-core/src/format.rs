use chrono::{DateTime, Utc};
use fundboard_domain::group_thousands;

#[must_use]
pub fn format_units(units: i64) -> String {
    group_thousands(units)
}

/// Two decimals with a percent sign, e.g. `35.00%`.
#[must_use]
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.2}%")
}

/// Share of `total` held by `units`, as a percentage. Zero for an empty total.
#[must_use]
pub fn percent_of(units: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    units as f64 / total as f64 * 100.0
}

/// `Jan 15, 2024`
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// `Jan 15, 2024, 10:30`
#[must_use]
pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %H:%M").to_string()
}
