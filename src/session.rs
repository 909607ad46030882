use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Work, Phase::ShortBreak, Phase::LongBreak];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "Work Session",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }

    /// Title and body announced when this phase runs out.
    pub fn completion_message(&self) -> (&'static str, &'static str) {
        match self {
            Self::Work => ("Work Session Complete!", "Great job! Time for a break."),
            Self::ShortBreak | Self::LongBreak => {
                ("Break Complete!", "Break is over. Ready to focus?")
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Read-only view handed to the presentation layer after every change.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: Phase,
    pub status: Status,
    pub remaining_ms: u64,
    pub total_duration_ms: u64,
    pub cycle_position: u32,
    pub sessions_before_long_break: u32,
    pub completed_today: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_focus_minutes: u32,
    pub weekly_sessions: [u32; 7],
}

impl Snapshot {
    /// Fraction of the current phase already elapsed, in `[0, 1]`.
    pub fn progress_ratio(&self) -> f64 {
        if self.total_duration_ms == 0 {
            return 1.0;
        }
        let remaining = self.remaining_ms as f64 / self.total_duration_ms as f64;
        (1.0 - remaining).clamp(0.0, 1.0)
    }

    /// `MM:SS`, rounding partial seconds up so the display never shows
    /// `00:00` while time is left.
    pub fn remaining_clock(&self) -> String {
        let secs = self.remaining_ms.div_ceil(1000);
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
