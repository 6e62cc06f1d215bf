use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// One schedule record per weekday, 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingHour {
    pub day_of_week: u8,
    pub is_working_day: bool,
    pub start_time: String,
    pub end_time: String,
    pub buffer_minutes: i32,
    pub max_appointments: i32,
}

pub const DEFAULT_BUFFER_MINUTES: i32 = 15;

impl WorkingHour {
    /// Hard-coded fallback used whenever a weekday has no stored record.
    pub fn default_for_day(day_of_week: u8) -> Self {
        match day_of_week {
            0 => Self {
                day_of_week,
                is_working_day: false,
                start_time: "00:00".to_string(),
                end_time: "00:00".to_string(),
                buffer_minutes: DEFAULT_BUFFER_MINUTES,
                max_appointments: 0,
            },
            6 => Self {
                day_of_week,
                is_working_day: true,
                start_time: "10:00".to_string(),
                end_time: "16:00".to_string(),
                buffer_minutes: DEFAULT_BUFFER_MINUTES,
                max_appointments: 8,
            },
            _ => Self {
                day_of_week,
                is_working_day: true,
                start_time: "09:00".to_string(),
                end_time: "18:00".to_string(),
                buffer_minutes: DEFAULT_BUFFER_MINUTES,
                max_appointments: 12,
            },
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.day_of_week > 6 {
            anyhow::bail!("day_of_week out of range: {}", self.day_of_week);
        }
        if self.is_working_day {
            let start = parse_time(&self.start_time)?;
            let end = parse_time(&self.end_time)?;
            if start >= end {
                anyhow::bail!(
                    "start_time {} is not before end_time {}",
                    self.start_time,
                    self.end_time
                );
            }
        }
        if self.buffer_minutes < 0 {
            anyhow::bail!("buffer_minutes must not be negative");
        }
        if self.max_appointments < 0 {
            anyhow::bail!("max_appointments must not be negative");
        }
        Ok(())
    }

    pub fn start(&self) -> anyhow::Result<NaiveTime> {
        parse_time(&self.start_time)
    }

    pub fn end(&self) -> anyhow::Result<NaiveTime> {
        parse_time(&self.end_time)
    }
}

pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| anyhow::anyhow!("invalid time: {s}"))
}
