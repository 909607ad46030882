use rtomato::{
    Clock, ConfigPatch, ManualClock, MemoryStore, Notifier, Persistence, Phase, SessionConfig,
    SessionController, Status, Wakeup,
    controller::{AUTO_ADVANCE_GRACE_MS, AUTO_SAVE_INTERVAL_MS, TICK_INTERVAL_MS},
    store::SESSION_KEY,
};
use std::{cell::RefCell, rc::Rc};

const MINUTE: i64 = 60_000;
const DAY: i64 = 24 * 60 * MINUTE;

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Rc<RefCell<Vec<String>>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, _body: &str) {
        self.sent.borrow_mut().push(title.to_string());
    }
}

struct Harness {
    clock: ManualClock,
    store: MemoryStore,
    sent: Rc<RefCell<Vec<String>>>,
    controller: SessionController,
}

impl Harness {
    fn new(config: SessionConfig) -> Self {
        let clock = ManualClock::at_date(2024, 5, 1);
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::default();
        let sent = notifier.sent.clone();
        let controller = SessionController::new(
            config,
            clock.clone(),
            Persistence::new(store.clone()),
            notifier,
        )
        .unwrap();
        Self { clock, store, sent, controller }
    }

    fn manual() -> Self {
        Self::new(SessionConfig {
            auto_advance: false,
            ..Default::default()
        })
    }

    /// Advances the clock by `ms`, waking the controller at every scheduled
    /// callback on the way, like a well-behaved driver loop.
    fn run_for(&mut self, ms: i64) {
        let end = self.clock.now_ms() + ms;
        loop {
            match self.controller.pending_wakeup().map(|w| w.at()) {
                Some(at) if at <= end => {
                    self.clock.set(at.max(self.clock.now_ms()));
                    self.controller.poll();
                }
                _ => {
                    self.clock.set(end);
                    self.controller.poll();
                    break;
                }
            }
        }
    }

    fn work_completions(&self) -> usize {
        self.sent
            .borrow()
            .iter()
            .filter(|t| t.as_str() == "Work Session Complete!")
            .count()
    }

    fn remaining(&self) -> u64 {
        self.controller.snapshot().remaining_ms
    }
}

#[test]
fn fresh_controller_is_idle_at_full_work_duration() {
    let h = Harness::manual();
    let snap = h.controller.snapshot();
    assert_eq!(snap.phase, Phase::Work);
    assert_eq!(snap.status, Status::Idle);
    assert_eq!(snap.remaining_ms, 25 * MINUTE as u64);
    assert_eq!(snap.total_duration_ms, 25 * MINUTE as u64);
    assert_eq!(h.controller.pending_wakeup(), None);
}

#[test]
fn set_phase_loads_exact_duration() {
    let mut h = Harness::new(SessionConfig {
        work_minutes: 50,
        short_break_minutes: 10,
        long_break_minutes: 30,
        ..Default::default()
    });
    h.controller.start();
    h.run_for(MINUTE);

    for phase in Phase::ALL {
        h.controller.set_phase(phase);
        let snap = h.controller.snapshot();
        assert_eq!(snap.phase, phase);
        assert_eq!(snap.status, Status::Idle);
        assert_eq!(snap.remaining_ms, h.controller.config().duration_for(phase));
        assert_eq!(snap.total_duration_ms, snap.remaining_ms);
        assert_eq!(h.controller.pending_wakeup(), None);
    }
}

#[test]
fn pause_then_start_keeps_remaining() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(90_000);

    assert!(h.controller.pause());
    let paused = h.remaining();
    assert_eq!(paused, (25 * MINUTE - 90_000) as u64);
    assert_eq!(h.controller.pending_wakeup(), None);

    assert!(h.controller.start());
    assert_eq!(h.remaining(), paused);
    assert_eq!(h.controller.status(), Status::Running);
}

#[test]
fn paused_time_does_not_count() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(5 * MINUTE);
    h.controller.pause();
    h.run_for(60 * MINUTE);

    assert_eq!(h.controller.status(), Status::Paused);
    assert_eq!(h.remaining(), 20 * MINUTE as u64);
}

#[test]
fn misuse_is_a_no_op() {
    let mut h = Harness::manual();
    let before = h.controller.snapshot();
    assert!(!h.controller.pause());
    assert_eq!(h.controller.snapshot(), before);
}

#[test]
fn completion_never_fires_early() {
    let mut h = Harness::manual();
    h.controller.start();

    h.clock.advance_ms(25 * MINUTE - 1);
    h.controller.poll();
    assert_eq!(h.controller.phase(), Phase::Work);
    assert_eq!(h.controller.status(), Status::Running);
    assert_eq!(h.remaining(), 1);
    assert_eq!(h.work_completions(), 0);

    h.run_for(1);
    assert_eq!(h.work_completions(), 1);
    assert_eq!(h.controller.phase(), Phase::ShortBreak);
    assert_eq!(h.controller.status(), Status::Idle);
}

#[test]
fn completion_fires_within_one_cadence_of_deadline() {
    let mut h = Harness::manual();
    h.controller.start();
    let deadline = h.clock.now_ms() + 25 * MINUTE;

    // Coarse driver that only wakes every cadence interval.
    while h.work_completions() == 0 {
        h.clock.advance_ms(TICK_INTERVAL_MS);
        h.controller.poll();
    }
    let fired_at = h.clock.now_ms();
    assert!(fired_at >= deadline);
    assert!(fired_at < deadline + TICK_INTERVAL_MS);
}

#[test]
fn double_start_keeps_one_countdown() {
    let mut h = Harness::manual();
    assert!(h.controller.start());
    h.run_for(1_000);
    assert!(!h.controller.start());

    h.run_for(30 * MINUTE);
    assert_eq!(h.work_completions(), 1);
    assert_eq!(h.controller.statistics().completed_today, 1);
}

#[test]
fn four_work_sessions_end_in_a_long_break() {
    let mut h = Harness::new(SessionConfig {
        work_minutes: 25,
        short_break_minutes: 5,
        long_break_minutes: 15,
        sessions_before_long_break: 4,
        auto_advance: false,
        ..Default::default()
    });

    let mut breaks = Vec::new();
    for _ in 0..4 {
        assert_eq!(h.controller.phase(), Phase::Work);
        h.controller.start();
        h.run_for(25 * MINUTE);
        breaks.push(h.controller.phase());

        let cycle = h.controller.snapshot().cycle_position;
        h.controller.start();
        h.run_for(15 * MINUTE);
        assert_eq!(h.controller.snapshot().cycle_position, cycle);
    }

    assert_eq!(
        breaks,
        [Phase::ShortBreak, Phase::ShortBreak, Phase::ShortBreak, Phase::LongBreak]
    );
    let snap = h.controller.snapshot();
    assert_eq!(snap.completed_today, 4);
    assert_eq!(snap.current_streak, 4);
    assert_eq!(snap.longest_streak, 4);
    assert_eq!(snap.total_focus_minutes, 100);
    assert_eq!(snap.cycle_position, 0);
}

#[test]
fn cycle_position_counts_only_natural_completions() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(10 * MINUTE);
    h.controller.reset();
    h.controller.set_phase(Phase::ShortBreak);
    h.controller.skip();

    let snap = h.controller.snapshot();
    assert_eq!(snap.cycle_position, 0);
    assert_eq!(snap.completed_today, 0);

    h.controller.start();
    h.run_for(25 * MINUTE);
    assert_eq!(h.controller.snapshot().cycle_position, 1);
}

#[test]
fn skip_during_work_is_rejected() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(MINUTE);
    let before = h.controller.snapshot();

    assert!(!h.controller.skip());
    assert_eq!(h.controller.snapshot(), before);
    assert_eq!(h.controller.status(), Status::Running);
}

#[test]
fn skip_during_break_is_streak_neutral() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(25 * MINUTE);
    assert_eq!(h.controller.phase(), Phase::ShortBreak);
    let before = h.controller.snapshot();

    h.controller.start();
    h.run_for(MINUTE);
    assert!(h.controller.skip());

    let after = h.controller.snapshot();
    assert_eq!(after.phase, Phase::Work);
    assert_eq!(after.status, Status::Idle);
    assert_eq!(after.remaining_ms, 25 * MINUTE as u64);
    assert_eq!(after.completed_today, before.completed_today);
    assert_eq!(after.current_streak, before.current_streak);
    assert_eq!(after.cycle_position, before.cycle_position);
    assert_eq!(h.controller.pending_wakeup(), None);
}

#[test]
fn skip_from_long_break() {
    let mut h = Harness::manual();
    h.controller.set_phase(Phase::LongBreak);
    assert!(h.controller.skip());
    assert_eq!(h.controller.phase(), Phase::Work);
    assert_eq!(h.controller.statistics().completed_today, 0);
}

#[test]
fn reset_restores_current_phase_duration() {
    let mut h = Harness::manual();
    h.controller.set_phase(Phase::ShortBreak);
    h.controller.start();
    h.run_for(2 * MINUTE);

    h.controller.reset();
    let snap = h.controller.snapshot();
    assert_eq!(snap.phase, Phase::ShortBreak);
    assert_eq!(snap.status, Status::Idle);
    assert_eq!(snap.remaining_ms, 5 * MINUTE as u64);
    assert_eq!(h.controller.pending_wakeup(), None);
}

#[test]
fn resume_recomputes_from_deadline_after_suspension() {
    let mut h = Harness::manual();
    h.controller.start();

    // Process suspended: no callbacks for ten minutes.
    h.clock.advance_ms(10 * MINUTE);
    h.controller.resume();

    assert_eq!(h.remaining(), 15 * MINUTE as u64);
    assert_eq!(h.controller.status(), Status::Running);
    assert_eq!(
        h.controller.pending_wakeup(),
        Some(Wakeup::Tick { at: h.clock.now_ms() + TICK_INTERVAL_MS })
    );
}

#[test]
fn resume_after_deadline_completes_once() {
    let mut h = Harness::manual();
    h.controller.start();

    h.clock.advance_ms(2 * 60 * MINUTE);
    h.controller.resume();
    h.controller.resume();
    h.controller.poll();

    assert_eq!(h.work_completions(), 1);
    assert_eq!(h.controller.phase(), Phase::ShortBreak);
    assert_eq!(h.controller.status(), Status::Idle);
}

#[test]
fn pause_after_unobserved_expiry_completes() {
    let mut h = Harness::manual();
    h.controller.start();
    h.clock.advance_ms(26 * MINUTE);

    assert!(h.controller.pause());
    assert_eq!(h.work_completions(), 1);
    assert_eq!(h.controller.phase(), Phase::ShortBreak);
}

#[test]
fn late_pause_completes_without_auto_start() {
    let mut h = Harness::new(SessionConfig::default());
    h.controller.start();
    h.clock.advance_ms(26 * MINUTE);

    assert!(h.controller.pause());
    assert_eq!(h.work_completions(), 1);
    assert_eq!(h.controller.phase(), Phase::ShortBreak);
    assert_eq!(h.controller.pending_wakeup(), None);

    h.run_for(AUTO_ADVANCE_GRACE_MS * 2);
    assert_eq!(h.controller.status(), Status::Idle);
    assert_eq!(h.remaining(), 5 * MINUTE as u64);
}

#[test]
fn auto_advance_starts_next_phase_after_grace() {
    let mut h = Harness::new(SessionConfig::default());
    h.controller.start();
    h.run_for(25 * MINUTE);

    assert_eq!(h.controller.phase(), Phase::ShortBreak);
    assert_eq!(h.controller.status(), Status::Idle);
    assert!(matches!(
        h.controller.pending_wakeup(),
        Some(Wakeup::AutoStart { .. })
    ));

    h.run_for(AUTO_ADVANCE_GRACE_MS - 1);
    assert_eq!(h.controller.status(), Status::Idle);

    h.run_for(1);
    assert_eq!(h.controller.status(), Status::Running);
    assert_eq!(h.remaining(), 5 * MINUTE as u64);
}

#[test]
fn explicit_command_cancels_pending_auto_start() {
    let mut h = Harness::new(SessionConfig::default());
    h.controller.start();
    h.run_for(25 * MINUTE);

    h.controller.reset();
    assert_eq!(h.controller.pending_wakeup(), None);
    h.run_for(AUTO_ADVANCE_GRACE_MS * 2);
    assert_eq!(h.controller.status(), Status::Idle);
}

#[test]
fn disabling_auto_advance_drops_pending_start() {
    let mut h = Harness::new(SessionConfig::default());
    h.controller.start();
    h.run_for(25 * MINUTE);

    h.controller
        .update_config(&ConfigPatch {
            auto_advance: Some(false),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(h.controller.pending_wakeup(), None);
}

#[test]
fn config_change_while_running_waits_for_next_phase() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(MINUTE);

    h.controller
        .update_config(&ConfigPatch {
            work_minutes: Some(50),
            short_break_minutes: Some(10),
            ..Default::default()
        })
        .unwrap();

    let snap = h.controller.snapshot();
    assert_eq!(snap.total_duration_ms, 25 * MINUTE as u64);
    assert_eq!(snap.remaining_ms, 24 * MINUTE as u64);

    h.run_for(24 * MINUTE);
    assert_eq!(h.controller.phase(), Phase::ShortBreak);
    assert_eq!(h.remaining(), 10 * MINUTE as u64);
    assert_eq!(h.controller.statistics().total_focus_minutes, 25);

    h.controller.skip();
    assert_eq!(h.remaining(), 50 * MINUTE as u64);
}

#[test]
fn config_change_while_paused_applies_immediately() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(5 * MINUTE);
    h.controller.pause();

    h.controller
        .update_config(&ConfigPatch {
            work_minutes: Some(30),
            ..Default::default()
        })
        .unwrap();

    let snap = h.controller.snapshot();
    assert_eq!(snap.status, Status::Paused);
    assert_eq!(snap.total_duration_ms, 30 * MINUTE as u64);
    assert_eq!(snap.remaining_ms, 30 * MINUTE as u64);
}

#[test]
fn unrelated_config_change_keeps_paused_progress() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(5 * MINUTE);
    h.controller.pause();

    h.controller
        .update_config(&ConfigPatch {
            long_break_minutes: Some(20),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(h.remaining(), 20 * MINUTE as u64);
}

#[test]
fn invalid_config_is_rejected_whole() {
    let mut h = Harness::manual();
    let before = h.controller.config().clone();

    let result = h.controller.update_config(&ConfigPatch {
        work_minutes: Some(45),
        sessions_before_long_break: Some(0),
        ..Default::default()
    });

    assert!(result.is_err());
    assert_eq!(h.controller.config(), &before);
    assert_eq!(h.remaining(), 25 * MINUTE as u64);
}

#[test]
fn shrinking_cycle_clamps_position() {
    let mut h = Harness::manual();
    for _ in 0..3 {
        h.controller.start();
        h.run_for(25 * MINUTE);
        h.controller.skip();
    }
    assert_eq!(h.controller.snapshot().cycle_position, 3);

    h.controller
        .update_config(&ConfigPatch {
            sessions_before_long_break: Some(2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(h.controller.snapshot().cycle_position, 1);

    h.controller.start();
    h.run_for(25 * MINUTE);
    assert_eq!(h.controller.phase(), Phase::LongBreak);
    assert_eq!(h.controller.snapshot().cycle_position, 0);
}

#[test]
fn notifications_can_be_turned_off() {
    let mut h = Harness::new(SessionConfig {
        auto_advance: false,
        notifications: false,
        ..Default::default()
    });
    h.controller.start();
    h.run_for(25 * MINUTE);
    assert!(h.sent.borrow().is_empty());
    assert_eq!(h.controller.statistics().completed_today, 1);
}

#[test]
fn break_completion_announces_break_end() {
    let mut h = Harness::manual();
    h.controller.set_phase(Phase::ShortBreak);
    h.controller.start();
    h.run_for(5 * MINUTE);

    assert_eq!(h.sent.borrow().as_slice(), ["Break Complete!"]);
    assert_eq!(h.controller.phase(), Phase::Work);
    assert_eq!(h.controller.statistics().completed_today, 0);
}

#[test]
fn listeners_see_every_change() {
    let mut h = Harness::manual();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    h.controller.subscribe(move |snap| sink.borrow_mut().push(snap.status));

    h.controller.start();
    h.controller.pause();
    h.controller.reset();

    assert_eq!(
        seen.borrow().as_slice(),
        [Status::Running, Status::Paused, Status::Idle]
    );
}

#[test]
fn completion_is_persisted() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(25 * MINUTE);

    let raw = h.store.get(SESSION_KEY).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["completedToday"], 1);
    assert_eq!(json["phase"], "shortBreak");
    assert_eq!(json["cyclePosition"], 1);
    assert_eq!(json["lastResetDateKey"], "2024-05-01");
    assert_eq!(json["config"]["workMinutes"], 25);
}

#[test]
fn failed_writes_degrade_and_retry_on_autosave() {
    let mut h = Harness::manual();
    h.store.set_fail_writes(true);

    h.controller.start();
    h.run_for(25 * MINUTE);
    assert_eq!(h.controller.statistics().completed_today, 1);
    assert!(h.store.get(SESSION_KEY).is_none());

    h.store.set_fail_writes(false);
    h.run_for(AUTO_SAVE_INTERVAL_MS);

    let raw = h.store.get(SESSION_KEY).unwrap();
    assert!(raw.contains("\"completedToday\": 1"));
}

#[test]
fn autosave_skips_clean_state() {
    let mut h = Harness::manual();
    h.run_for(AUTO_SAVE_INTERVAL_MS * 3);
    assert_eq!(h.store.write_count(), 0);

    h.controller.shutdown();
    assert_eq!(h.store.write_count(), 1);
}

#[test]
fn new_day_resets_daily_counters_on_poll() {
    let mut h = Harness::manual();
    h.controller.start();
    h.run_for(25 * MINUTE);
    h.controller.skip();
    h.controller.start();
    h.run_for(25 * MINUTE);
    assert_eq!(h.controller.statistics().current_streak, 2);

    h.clock.advance_ms(DAY);
    h.controller.poll();

    let snap = h.controller.snapshot();
    assert_eq!(snap.completed_today, 0);
    assert_eq!(snap.current_streak, 0);
    assert_eq!(snap.total_focus_minutes, 0);
    assert_eq!(snap.longest_streak, 2);
}

#[test]
fn remaining_stays_within_bounds() {
    let mut h = Harness::manual();
    h.controller.start();
    for _ in 0..200 {
        h.clock.advance_ms(7_919);
        h.controller.poll();
        let snap = h.controller.snapshot();
        assert!(snap.remaining_ms <= snap.total_duration_ms);
    }
}
