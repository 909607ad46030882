use crate::clock::Clock;
use log::info;

/// Completion counters. Daily counters reset when the local date changes;
/// `longest_streak` is all-time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub completed_today: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_focus_minutes: u32,
    /// Natural work completions per weekday this ISO week, Monday first.
    pub weekly_sessions: [u32; 7],
    pub last_reset_date_key: String,
    pub week_key: String,
}

impl Statistics {
    pub fn fresh(clock: &dyn Clock) -> Self {
        Self {
            last_reset_date_key: clock.today_key(),
            week_key: clock.week_key(),
            ..Default::default()
        }
    }

    /// Resets daily counters on a date change and the weekly tally on a week
    /// change. Returns whether anything was reset.
    pub fn roll_over(&mut self, clock: &dyn Clock) -> bool {
        let mut changed = false;

        let today = clock.today_key();
        if self.last_reset_date_key != today {
            info!(
                "New day ({} -> {}), resetting daily counters",
                self.last_reset_date_key, today
            );
            self.completed_today = 0;
            self.current_streak = 0;
            self.total_focus_minutes = 0;
            self.last_reset_date_key = today;
            changed = true;
        }

        let week = clock.week_key();
        if self.week_key != week {
            self.weekly_sessions = [0; 7];
            self.week_key = week;
            changed = true;
        }

        changed
    }

    /// Books one naturally completed work session.
    pub fn record_work(&mut self, minutes: u32, clock: &dyn Clock) {
        self.roll_over(clock);
        self.completed_today += 1;
        self.current_streak += 1;
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.total_focus_minutes += minutes;

        let day = clock.weekday_index().min(6);
        self.weekly_sessions[day] += 1;
    }
}
