use std::sync::OnceLock;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Parses a reminder time: RFC 3339 (`2026-08-06T18:30:00Z`), local
/// `YYYY-MM-DD HH:MM`, local `YYYY-MM-DD` (midnight), or a relative offset
/// such as `90m`, `+2h`, `1d12h30m`.
pub fn parse_reminder_expr(input: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("empty reminder expression"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return local_to_utc(naive);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("invalid date: {trimmed}"))?;
        return local_to_utc(naive);
    }

    if let Some(offset) = parse_relative(trimmed)? {
        return Ok(now + offset);
    }

    Err(anyhow!("unrecognized reminder expression: {input}"))
}

pub fn format_local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn local_to_utc(naive: NaiveDateTime) -> anyhow::Result<DateTime<Utc>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // DST fold: take the earlier of the two readings.
        LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(anyhow!("nonexistent local time: {naive}")),
    }
}

fn relative_regex() -> &'static Regex {
    static RELATIVE: OnceLock<Regex> = OnceLock::new();
    RELATIVE.get_or_init(|| {
        Regex::new(r"^\+?(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?$").expect("relative offset pattern")
    })
}

fn parse_relative(input: &str) -> anyhow::Result<Option<Duration>> {
    let Some(caps) = relative_regex().captures(input) else {
        return Ok(None);
    };

    let days = caps
        .get(1)
        .map(|m| m.as_str().parse::<i64>())
        .transpose()?;
    let hours = caps
        .get(2)
        .map(|m| m.as_str().parse::<i64>())
        .transpose()?;
    let minutes = caps
        .get(3)
        .map(|m| m.as_str().parse::<i64>())
        .transpose()?;

    // Every group is optional, so a bare "+" also matches the pattern.
    if days.is_none() && hours.is_none() && minutes.is_none() {
        return Ok(None);
    }

    Ok(Some(
        Duration::days(days.unwrap_or(0))
            + Duration::hours(hours.unwrap_or(0))
            + Duration::minutes(minutes.unwrap_or(0)),
    ))
}
