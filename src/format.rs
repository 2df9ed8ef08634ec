use chrono::{DateTime, NaiveDateTime, Utc};

/// `YYYY-MM-DD HH:MM:SS` in UTC. Values that don't parse are returned as-is.
pub fn format_timestamp(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S").to_string();
    }
    match NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => value.to_string(),
    }
}

/// Card counters: thousands collapse to `Nk`.
pub fn format_count(count: u64) -> String {
    if count >= 1_000 {
        format!("{}k", count / 1_000)
    } else {
        count.to_string()
    }
}
