//! When a job fires next.
//!
//! Triggers are evaluated against naive local wall-clock time. Every
//! `next_after` result is strictly later than its argument, so a job that
//! just fired never fires again on the same instant.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use std::fmt;

use super::error::ScheduleError;

/// Longest accepted interval.
const MAX_INTERVAL_HOURS: u32 = 24 * 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Daily { at: NaiveTime },
    Interval { every: Duration },
    Weekly { day: Weekday, at: NaiveTime },
    Once { at: NaiveDateTime },
}

impl Trigger {
    pub fn daily(at: &str) -> Result<Self, ScheduleError> {
        Ok(Self::Daily { at: parse_time(at)? })
    }

    /// Every `n` hours, for `n` between one hour and a year.
    pub fn hours(n: u32) -> Result<Self, ScheduleError> {
        if n == 0 || n > MAX_INTERVAL_HOURS {
            return Err(ScheduleError::InvalidInterval(format!("{n}h")));
        }
        Ok(Self::Interval {
            every: Duration::hours(i64::from(n)),
        })
    }

    pub fn minutes(n: u32) -> Result<Self, ScheduleError> {
        if n == 0 || n / 60 > MAX_INTERVAL_HOURS {
            return Err(ScheduleError::InvalidInterval(format!("{n}m")));
        }
        Ok(Self::Interval {
            every: Duration::minutes(i64::from(n)),
        })
    }

    pub fn weekly(day: &str, at: &str) -> Result<Self, ScheduleError> {
        let day = day
            .parse::<Weekday>()
            .map_err(|_| ScheduleError::InvalidDay(day.to_string()))?;
        Ok(Self::Weekly {
            day,
            at: parse_time(at)?,
        })
    }

    /// Parse a `(frequency, time spec)` pair:
    /// `daily "HH:MM"`, `hourly ""|"N"`, `every "Nh"|"Nm"`, `weekly "<day> HH:MM"`.
    pub fn parse(frequency: &str, spec: &str) -> Result<Self, ScheduleError> {
        let spec = spec.trim();
        match frequency.trim().to_ascii_lowercase().as_str() {
            "daily" => Self::daily(spec),
            "hourly" if spec.is_empty() => Self::hours(1),
            "hourly" => spec
                .parse::<u32>()
                .map_err(|_| ScheduleError::InvalidInterval(spec.to_string()))
                .and_then(Self::hours),
            "every" => parse_interval(spec),
            "weekly" => {
                let mut parts = spec.split_whitespace();
                let day = parts
                    .next()
                    .ok_or_else(|| ScheduleError::InvalidDay(spec.to_string()))?;
                let at = parts
                    .next()
                    .ok_or_else(|| ScheduleError::InvalidTime(spec.to_string()))?;
                Self::weekly(day, at)
            }
            other => Err(ScheduleError::UnknownFrequency(other.to_string())),
        }
    }

    /// The first deadline for a job registered at `now`. One-shot triggers in
    /// the past are due immediately.
    pub fn first_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Once { at } => Some(*at),
            _ => self.next_after(now),
        }
    }

    /// The earliest fire time strictly after `after`, or `None` once exhausted
    /// or past the end of the calendar.
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            Self::Daily { at } => {
                let candidate = after.date().and_time(at);
                if candidate > after {
                    Some(candidate)
                } else {
                    candidate.checked_add_signed(Duration::days(1))
                }
            }
            Self::Interval { every } => after.checked_add_signed(every),
            Self::Weekly { day, at } => {
                let ahead = (7 + day.num_days_from_monday() as i64
                    - after.weekday().num_days_from_monday() as i64)
                    % 7;
                let candidate = after
                    .date()
                    .and_time(at)
                    .checked_add_signed(Duration::days(ahead))?;
                if candidate > after {
                    Some(candidate)
                } else {
                    candidate.checked_add_signed(Duration::days(7))
                }
            }
            Self::Once { at } => (at > after).then_some(at),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily { at } => write!(f, "daily at {}", at.format("%H:%M")),
            Self::Interval { every } if every.num_minutes() % 60 == 0 => {
                write!(f, "every {}h", every.num_hours())
            }
            Self::Interval { every } => write!(f, "every {}m", every.num_minutes()),
            Self::Weekly { day, at } => write!(f, "weekly on {day} at {}", at.format("%H:%M")),
            Self::Once { at } => write!(f, "once at {}", at.format("%Y-%m-%d %H:%M")),
        }
    }
}

fn parse_time(spec: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(spec.trim(), "%H:%M")
        .map_err(|_| ScheduleError::InvalidTime(spec.to_string()))
}

fn parse_interval(spec: &str) -> Result<Trigger, ScheduleError> {
    let invalid = || ScheduleError::InvalidInterval(spec.to_string());
    let (digits, unit) = match spec.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((i, _)) => spec.split_at(i),
        None => (spec, "h"),
    };
    let n: u32 = digits.parse().map_err(|_| invalid())?;
    if n == 0 {
        return Err(invalid());
    }
    match unit {
        "h" => Trigger::hours(n),
        "m" => Trigger::minutes(n),
        _ => Err(invalid()),
    }
}
