use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

/// Get the configuration directory path
/// If profile is Dev, uses "nextup-dev" instead of "nextup"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "nextup-dev",
        Profile::Prod => "nextup",
    };
    // Use "com" as qualifier for better cross-platform compatibility
    ProjectDirs::from("com", "nextup", app_name).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path
/// If profile is Dev, uses "nextup-dev" instead of "nextup"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "nextup-dev",
        Profile::Prod => "nextup",
    };
    ProjectDirs::from("com", "nextup", app_name).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Current instant as Unix epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse a deadline from user input, relative to `now`.
/// Accepts relative offsets ("30m", "2h", "3d", "1w"), a date
/// ("YYYY-MM-DD", due at 23:59 local time) or a full local
/// date-time ("YYYY-MM-DD HH:MM"). Returns Unix epoch milliseconds.
pub fn parse_deadline(input: &str, now: i64) -> Result<i64, String> {
    let s = input.trim();

    if let Some(ms) = parse_relative(s, now) {
        return Ok(ms);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return local_ms(dt).ok_or_else(|| format!("'{}' is not a valid local time", s));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let dt = date
            .and_hms_opt(23, 59, 0)
            .ok_or_else(|| format!("'{}' is not a valid date", s))?;
        return local_ms(dt).ok_or_else(|| format!("'{}' is not a valid local time", s));
    }

    Err(format!(
        "Unrecognized deadline '{}' (try '2h', '2025-03-01' or '2025-03-01 17:00')",
        s
    ))
}

/// Parse a relative offset like "30m", "2h", "3d" or "1w"
fn parse_relative(s: &str, now: i64) -> Option<i64> {
    let unit_ms = match s.chars().last()? {
        'm' => 60_000,
        'h' => 3_600_000,
        'd' => 86_400_000,
        'w' => 7 * 86_400_000,
        _ => return None,
    };
    let count: i64 = s[..s.len() - 1].parse().ok()?;
    Some(now + count * unit_ms)
}

/// Resolve a naive local date-time to epoch milliseconds.
/// Returns None for instants that do not exist locally (DST gaps).
fn local_ms(naive: NaiveDateTime) -> Option<i64> {
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Format an instant as a local "YYYY-MM-DD HH:MM" string
pub fn format_instant(ms: i64) -> String {
    let utc = DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Format an instant as a local "HH:MM" string
pub fn format_time(ms: i64) -> String {
    let utc = DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    utc.with_timezone(&Local).format("%H:%M").to_string()
}

/// Format a worked duration as "2h 15m" / "45m" / "< 1m"
pub fn format_duration(ms: i64) -> String {
    let minutes = ms / 60_000;
    if minutes <= 0 {
        return "< 1m".to_string();
    }
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}
