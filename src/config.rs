use crate::{error::ConfigError, session::Phase};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const MINUTES_RANGE: RangeInclusive<u32> = 1..=120;
pub const SESSIONS_RANGE: RangeInclusive<u32> = 1..=12;

const MS_PER_MINUTE: u64 = 60_000;

/// Durations and behaviour for a run of sessions. Replaced wholesale on
/// every settings change.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub sessions_before_long_break: u32,
    pub auto_advance: bool,
    pub notifications: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_before_long_break: 4,
            auto_advance: true,
            notifications: true,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("workMinutes", self.work_minutes, MINUTES_RANGE)?;
        check("shortBreakMinutes", self.short_break_minutes, MINUTES_RANGE)?;
        check("longBreakMinutes", self.long_break_minutes, MINUTES_RANGE)?;
        check(
            "sessionsBeforeLongBreak",
            self.sessions_before_long_break,
            SESSIONS_RANGE,
        )
    }

    pub fn minutes_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::ShortBreak => self.short_break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        }
    }

    pub fn duration_for(&self, phase: Phase) -> u64 {
        u64::from(self.minutes_for(phase)) * MS_PER_MINUTE
    }

    /// Applies `patch` to a copy and validates it. `self` is untouched either way.
    pub fn merged(&self, patch: &ConfigPatch) -> Result<Self, ConfigError> {
        let next = Self {
            work_minutes: patch.work_minutes.unwrap_or(self.work_minutes),
            short_break_minutes: patch.short_break_minutes.unwrap_or(self.short_break_minutes),
            long_break_minutes: patch.long_break_minutes.unwrap_or(self.long_break_minutes),
            sessions_before_long_break: patch
                .sessions_before_long_break
                .unwrap_or(self.sessions_before_long_break),
            auto_advance: patch.auto_advance.unwrap_or(self.auto_advance),
            notifications: patch.notifications.unwrap_or(self.notifications),
        };
        next.validate()?;
        Ok(next)
    }
}

fn check(field: &'static str, value: u32, range: RangeInclusive<u32>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Partial settings update; `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub work_minutes: Option<u32>,
    pub short_break_minutes: Option<u32>,
    pub long_break_minutes: Option<u32>,
    pub sessions_before_long_break: Option<u32>,
    pub auto_advance: Option<bool>,
    pub notifications: Option<bool>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
