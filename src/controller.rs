//! The focus/break state machine.
//!
//! All countdown math runs on wall-clock timestamps: a running phase stores
//! its deadline and every observation computes `deadline - now`. The driver
//! only has to call [`SessionController::poll`] when
//! [`SessionController::next_wakeup_in`] says something is due; late or
//! skipped wake-ups (suspended process, backgrounded terminal) cost
//! responsiveness, never accuracy.

use crate::{
    clock::Clock,
    config::{ConfigPatch, SessionConfig},
    error::ConfigError,
    notifier::Notifier,
    session::{Phase, Snapshot, Status},
    stats::Statistics,
    store::{PersistedRecord, Persistence, SESSION_KEY},
};
use log::{debug, info};
use std::time::Duration;

/// Countdown cadence while running.
pub const TICK_INTERVAL_MS: i64 = 200;
/// Pause between a completed phase and the automatic start of the next one.
pub const AUTO_ADVANCE_GRACE_MS: i64 = 3_000;
/// How often unsaved state is flushed.
pub const AUTO_SAVE_INTERVAL_MS: i64 = 30_000;

/// The one pending scheduled callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wakeup {
    Tick { at: i64 },
    AutoStart { at: i64 },
}

impl Wakeup {
    pub fn at(&self) -> i64 {
        match *self {
            Self::Tick { at } | Self::AutoStart { at } => at,
        }
    }
}

pub type Listener = Box<dyn FnMut(&Snapshot)>;

pub struct SessionController {
    config: SessionConfig,
    phase: Phase,
    status: Status,
    total_duration_ms: u64,
    /// Authoritative while idle or paused; refreshed from `deadline` on
    /// every tick while running.
    remaining_ms: u64,
    deadline: Option<i64>,
    cycle_position: u32,
    stats: Statistics,
    wakeup: Option<Wakeup>,
    dirty: bool,
    last_save_ms: i64,
    clock: Box<dyn Clock>,
    persistence: Persistence,
    notifier: Box<dyn Notifier>,
    listeners: Vec<Listener>,
}

impl SessionController {
    /// Fresh controller with no history. Nothing is read from `persistence`.
    pub fn new(
        config: SessionConfig,
        clock: impl Clock + 'static,
        persistence: Persistence,
        notifier: impl Notifier + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let stats = Statistics::fresh(&clock);
        let record = PersistedRecord::new(&config, &stats, Phase::Work, 0);
        Ok(Self::from_record(record, Box::new(clock), persistence, Box::new(notifier)))
    }

    /// Controller resumed from whatever `persistence` holds, defaulting
    /// anything missing or invalid. Always starts idle.
    pub fn restore(
        clock: impl Clock + 'static,
        persistence: Persistence,
        notifier: impl Notifier + 'static,
    ) -> Self {
        let record = persistence
            .load(SESSION_KEY, PersistedRecord::default())
            .normalized();
        let mut controller =
            Self::from_record(record, Box::new(clock), persistence, Box::new(notifier));
        if controller.stats.roll_over(controller.clock.as_ref()) {
            controller.dirty = true;
        }
        controller
    }

    fn from_record(
        record: PersistedRecord,
        clock: Box<dyn Clock>,
        persistence: Persistence,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let total = record.config.duration_for(record.phase);
        let now = clock.now_ms();
        let mut stats = record.statistics();
        if stats.last_reset_date_key.is_empty() {
            stats.last_reset_date_key = clock.today_key();
        }
        if stats.week_key.is_empty() {
            stats.week_key = clock.week_key();
        }

        Self {
            phase: record.phase,
            status: Status::Idle,
            total_duration_ms: total,
            remaining_ms: total,
            deadline: None,
            cycle_position: record.cycle_position,
            stats,
            config: record.config,
            wakeup: None,
            dirty: false,
            last_save_ms: now,
            clock,
            persistence,
            notifier,
            listeners: Vec::new(),
        }
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            status: self.status,
            remaining_ms: self.live_remaining_ms(),
            total_duration_ms: self.total_duration_ms,
            cycle_position: self.cycle_position,
            sessions_before_long_break: self.config.sessions_before_long_break,
            completed_today: self.stats.completed_today,
            current_streak: self.stats.current_streak,
            longest_streak: self.stats.longest_streak,
            total_focus_minutes: self.stats.total_focus_minutes,
            weekly_sessions: self.stats.weekly_sessions,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn pending_wakeup(&self) -> Option<Wakeup> {
        self.wakeup
    }

    /// How long the driver may sleep before calling [`Self::poll`].
    pub fn next_wakeup_in(&self) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.wakeup
            .map(|w| Duration::from_millis((w.at() - now).max(0) as u64))
    }

    /// Registers a callback fired after every state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&Snapshot) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Starts or resumes the countdown. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.status == Status::Running {
            return false;
        }
        if self.remaining_ms == 0 {
            self.remaining_ms = self.total_duration_ms;
        }

        let now = self.clock.now_ms();
        let deadline = now + self.remaining_ms as i64;
        self.deadline = Some(deadline);
        self.status = Status::Running;
        self.schedule_tick(now);

        debug!(
            "Started {:?} with {} ms left (deadline {deadline})",
            self.phase, self.remaining_ms
        );
        self.emit();
        true
    }

    /// Freezes the remaining time. Returns `false` if not running.
    pub fn pause(&mut self) -> bool {
        if self.status != Status::Running {
            return false;
        }

        self.remaining_ms = self.live_remaining_ms();
        if self.remaining_ms == 0 {
            // Expired while unobserved; the pause comes too late to stop
            // the completion but still holds off the next phase.
            self.complete(false);
            return true;
        }

        self.status = Status::Paused;
        self.deadline = None;
        self.wakeup = None;
        debug!("Paused {:?} with {} ms left", self.phase, self.remaining_ms);
        self.emit();
        true
    }

    /// Back to the full duration of the current phase, idle.
    pub fn reset(&mut self) {
        self.wakeup = None;
        self.deadline = None;
        self.status = Status::Idle;
        self.remaining_ms = self.total_duration_ms;
        debug!("Reset {:?}", self.phase);
        self.emit();
    }

    /// Ends a break early and returns to work without touching any counter.
    /// Work phases cannot be skipped; returns `false` and changes nothing.
    pub fn skip(&mut self) -> bool {
        if self.phase == Phase::Work {
            debug!("Ignoring skip during a work phase");
            return false;
        }

        info!("Skipped {:?}", self.phase);
        self.enter_phase(Phase::Work);
        self.persist();
        self.emit();
        true
    }

    /// Switches to `target` explicitly, idle at its full duration.
    pub fn set_phase(&mut self, target: Phase) {
        self.enter_phase(target);
        self.persist();
        self.emit();
    }

    /// Merges `patch` into the config. Invalid patches change nothing.
    ///
    /// Idle and paused phases pick up the new duration immediately; a
    /// running countdown keeps its deadline and the change applies from the
    /// next phase on.
    pub fn update_config(&mut self, patch: &ConfigPatch) -> Result<(), ConfigError> {
        let next = self.config.merged(patch)?;
        if next == self.config {
            return Ok(());
        }
        self.config = next;

        let cycle = self.config.sessions_before_long_break;
        if self.cycle_position >= cycle {
            self.cycle_position = cycle - 1;
        }

        let duration = self.config.duration_for(self.phase);
        if self.status != Status::Running && duration != self.total_duration_ms {
            self.total_duration_ms = duration;
            self.remaining_ms = duration;
        }

        if !self.config.auto_advance && matches!(self.wakeup, Some(Wakeup::AutoStart { .. })) {
            self.wakeup = None;
        }

        info!("Config updated: {:?}", self.config);
        self.persist();
        self.emit();
        Ok(())
    }

    /// Runs whatever is due: a countdown tick, a deferred auto-start, the
    /// daily rollover and the periodic save.
    pub fn poll(&mut self) {
        let now = self.clock.now_ms();

        if self.stats.roll_over(self.clock.as_ref()) {
            self.dirty = true;
            self.emit();
        }

        match self.wakeup {
            Some(Wakeup::Tick { at }) if at <= now => {
                self.wakeup = None;
                self.tick();
            }
            Some(Wakeup::AutoStart { at }) if at <= now => {
                self.wakeup = None;
                self.start();
            }
            _ => {}
        }

        if self.dirty && now - self.last_save_ms >= AUTO_SAVE_INTERVAL_MS {
            self.persist();
        }
    }

    /// Call when the process regains attention after possibly being
    /// suspended. Recomputes the remaining time before the next cadence tick.
    pub fn resume(&mut self) {
        if self.status == Status::Running {
            self.wakeup = None;
            self.tick();
        }
        self.poll();
    }

    /// Final flush before the process exits.
    pub fn shutdown(&mut self) {
        self.wakeup = None;
        self.persist();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn live_remaining_ms(&self) -> u64 {
        match (self.status, self.deadline) {
            (Status::Running, Some(deadline)) => {
                let left = (deadline - self.clock.now_ms()).max(0) as u64;
                left.min(self.total_duration_ms)
            }
            _ => self.remaining_ms.min(self.total_duration_ms),
        }
    }

    fn schedule_tick(&mut self, now: i64) {
        let at = match self.deadline {
            Some(deadline) => (now + TICK_INTERVAL_MS).min(deadline),
            None => now + TICK_INTERVAL_MS,
        };
        self.wakeup = Some(Wakeup::Tick { at });
    }

    fn tick(&mut self) {
        if self.status != Status::Running {
            return;
        }

        self.remaining_ms = self.live_remaining_ms();
        if self.remaining_ms == 0 {
            self.complete(self.config.auto_advance);
            return;
        }

        let now = self.clock.now_ms();
        self.schedule_tick(now);
        self.emit();
    }

    /// Runs once per phase instance: the caller has just observed zero
    /// remaining time, and this clears the deadline before anything else.
    /// `auto_start` queues the next phase after the grace period.
    fn complete(&mut self, auto_start: bool) {
        self.wakeup = None;
        self.deadline = None;
        self.remaining_ms = 0;

        let finished = self.phase;
        if finished == Phase::Work {
            let minutes = (self.total_duration_ms / 60_000) as u32;
            self.stats.record_work(minutes, self.clock.as_ref());
            self.cycle_position += 1;
        }
        info!(
            "Completed {:?}; {} today, streak {}",
            finished, self.stats.completed_today, self.stats.current_streak
        );

        if self.config.notifications {
            let (title, body) = finished.completion_message();
            self.notifier.notify(title, body);
        }

        let next = self.next_phase(finished);
        self.enter_phase(next);
        self.persist();

        if auto_start {
            let at = self.clock.now_ms() + AUTO_ADVANCE_GRACE_MS;
            self.wakeup = Some(Wakeup::AutoStart { at });
        }
        self.emit();
    }

    fn next_phase(&mut self, finished: Phase) -> Phase {
        match finished {
            Phase::Work if self.cycle_position >= self.config.sessions_before_long_break => {
                self.cycle_position = 0;
                Phase::LongBreak
            }
            Phase::Work => Phase::ShortBreak,
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        }
    }

    fn enter_phase(&mut self, phase: Phase) {
        self.wakeup = None;
        self.deadline = None;
        self.status = Status::Idle;
        self.phase = phase;
        self.total_duration_ms = self.config.duration_for(phase);
        self.remaining_ms = self.total_duration_ms;
        self.dirty = true;
        debug!("Entered {phase:?} ({} ms)", self.total_duration_ms);
    }

    fn persist(&mut self) {
        let record =
            PersistedRecord::new(&self.config, &self.stats, self.phase, self.cycle_position);
        if self.persistence.save(SESSION_KEY, &record) {
            self.dirty = false;
        } else {
            self.dirty = true;
        }
        self.last_save_ms = self.clock.now_ms();
    }

    fn emit(&mut self) {
        let snapshot = self.snapshot();
        for listener in &mut self.listeners {
            listener(&snapshot);
        }
    }
}
