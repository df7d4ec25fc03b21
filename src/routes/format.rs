//! Display helpers shared by templates.

use chrono::{NaiveDateTime, Utc};

/// Relative form of a `datetime('now')` column value.
pub fn parse_and_format_time(db_time: &str) -> String {
    NaiveDateTime::parse_from_str(db_time, "%Y-%m-%d %H:%M:%S")
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|_| db_time.to_string())
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let now = Utc::now().naive_utc();
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

/// Star string for a nullable rating.
pub fn stars(rating: Option<i64>) -> String {
    match rating {
        Some(n) => "★".repeat(n.clamp(0, 5) as usize) + &"☆".repeat(5 - n.clamp(0, 5) as usize),
        None => "not rated".to_string(),
    }
}

/// Minutes as `"1 h 15 min"`.
pub fn minutes(value: Option<i64>) -> String {
    match value {
        Some(m) if m >= 60 && m % 60 == 0 => format!("{} h", m / 60),
        Some(m) if m >= 60 => format!("{} h {} min", m / 60, m % 60),
        Some(m) => format!("{} min", m),
        None => "-".to_string(),
    }
}

pub fn skill_level(value: Option<i64>) -> &'static str {
    match value {
        Some(1) => "Easy",
        Some(2) => "Medium",
        Some(3) => "Demanding",
        Some(4) => "Expert",
        _ => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn format_relative_time_just_now() {
        let now = Utc::now().naive_utc();
        assert_eq!(format_relative_time(&now), "just now");
    }

    #[test]
    fn format_relative_time_hours() {
        let dt = Utc::now().naive_utc() - chrono::Duration::hours(3);
        assert_eq!(format_relative_time(&dt), "3h ago");
    }

    #[test]
    fn format_relative_time_old_date() {
        let dt = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(format_relative_time(&dt), "Jan 15, 2025");
    }

    #[test]
    fn parse_and_format_bad_input_returns_raw() {
        assert_eq!(parse_and_format_time("not-a-date"), "not-a-date");
    }

    #[test]
    fn stars_and_minutes() {
        assert_eq!(stars(Some(3)), "★★★☆☆");
        assert_eq!(stars(None), "not rated");
        assert_eq!(minutes(Some(75)), "1 h 15 min");
        assert_eq!(minutes(Some(120)), "2 h");
        assert_eq!(minutes(Some(20)), "20 min");
        assert_eq!(minutes(None), "-");
        assert_eq!(skill_level(Some(2)), "Medium");
    }
}
