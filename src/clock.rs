use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use std::{cell::Cell, rc::Rc};

const DAILY_FMT: &str = "%Y-%m-%d";

/// Wall-clock source for the controller.
///
/// Countdown math is done on absolute millisecond timestamps so the session
/// stays correct when the process is suspended between callbacks.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Local calendar date, `YYYY-MM-DD`.
    fn today_key(&self) -> String;

    /// Local weekday, Monday = 0.
    fn weekday_index(&self) -> usize;

    /// ISO week, `YYYY-Www`.
    fn week_key(&self) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today_key(&self) -> String {
        Local::now().format(DAILY_FMT).to_string()
    }

    fn weekday_index(&self) -> usize {
        Local::now().weekday().num_days_from_monday() as usize
    }

    fn week_key(&self) -> String {
        iso_week_key(&Local::now())
    }
}

/// Settable clock. Clones share the same instant, so a test can hold one
/// handle while the controller owns another.
///
/// Calendar keys are derived in UTC so results do not depend on the host
/// time zone.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    /// Starts at noon UTC on the given date.
    pub fn at_date(year: i32, month: u32, day: u32) -> Self {
        let start = Utc
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_default();
        Self::new(start)
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }

    fn utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now.get()).unwrap_or_default()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }

    fn today_key(&self) -> String {
        self.utc().format(DAILY_FMT).to_string()
    }

    fn weekday_index(&self) -> usize {
        self.utc().weekday().num_days_from_monday() as usize
    }

    fn week_key(&self) -> String {
        iso_week_key(&self.utc())
    }
}

fn iso_week_key<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let week = dt.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}
