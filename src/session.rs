//! Focus session controller.
//!
//! Pure state machine: every operation takes the current time, and timers are
//! fired by [`FocusSession::advance_to`] in due order. Observable effects are
//! queued as [`SessionEvent`]s for the presentation layer to drain.

use serde::Serialize;
use std::time::Duration;

use crate::movement::{CharacterMotion, MovementAnimator, Position, RandomSource, Viewport};
use crate::reminder::{ReminderScheduler, ReminderState};
use crate::settings::Settings;
use crate::target::TargetTimer;
use crate::timers::{TimerKind, TimerSlots};

/// Elapsed-time display refresh.
pub const TICK_EVERY: Duration = Duration::from_secs(1);
/// Sessions at least this long get an encouragement when stopped early.
pub const ENCOURAGEMENT_MIN_SECS: u64 = 60;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub active: bool,
    /// Clock reading when the running session began.
    pub started_at: Option<Duration>,
    pub hit_count: u32,
    pub cumulative_focused_secs: u64,
    pub target_reached: bool,
}

/// Something the presentation layer should show.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    #[serde(rename_all = "camelCase")]
    Started { hit_count: u32 },
    #[serde(rename_all = "camelCase")]
    Tick { elapsed_secs: u64 },
    CharacterShown { position: Position },
    #[serde(rename_all = "camelCase")]
    CharacterMoved { position: Position, facing_deg: f64 },
    CharacterHidden,
    #[serde(rename_all = "camelCase")]
    Hit { hit_count: u32, position: Position },
    #[serde(rename_all = "camelCase")]
    TargetReached { target_secs: u64 },
    #[serde(rename_all = "camelCase")]
    Encouragement { session_secs: u64 },
    #[serde(rename_all = "camelCase")]
    Stopped {
        session_secs: u64,
        total_focused_secs: u64,
    },
}

/// Result of stopping a running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_secs: u64,
    pub total_focused_secs: u64,
    pub hit_count: u32,
    pub target_reached: bool,
}

pub struct FocusSession {
    state: SessionState,
    timers: TimerSlots,
    reminder: ReminderScheduler,
    target: TargetTimer,
    animator: MovementAnimator,
    reminder_interval: Duration,
    target_duration: Duration,
    viewport: Viewport,
    rng: Box<dyn RandomSource>,
    now: Duration,
    events: Vec<SessionEvent>,
}

impl FocusSession {
    pub fn new(settings: &Settings, viewport: Viewport, rng: Box<dyn RandomSource>) -> Self {
        Self {
            state: SessionState::default(),
            timers: TimerSlots::new(),
            reminder: ReminderScheduler::new(),
            target: TargetTimer::new(),
            animator: MovementAnimator::new(),
            reminder_interval: settings.reminder_interval(),
            target_duration: settings.target_duration(),
            viewport,
            rng,
            now: Duration::ZERO,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn reminder_state(&self) -> ReminderState {
        self.reminder.state()
    }

    pub fn character(&self) -> &CharacterMotion {
        self.animator.motion()
    }

    pub fn is_character_moving(&self) -> bool {
        self.animator.is_moving(&self.timers)
    }

    pub fn timers(&self) -> &TimerSlots {
        &self.timers
    }

    pub fn reminder_interval(&self) -> Duration {
        self.reminder_interval
    }

    pub fn target_duration(&self) -> Duration {
        self.target_duration
    }

    /// Latest clock reading seen.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Whole seconds since the running session began.
    pub fn elapsed_secs(&self, now: Duration) -> Option<u64> {
        self.state
            .started_at
            .map(|started| now.saturating_sub(started).as_secs())
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Fire every timer due at or before `now`, in due order.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((kind, due)) = self.timers.pop_due(now) {
            self.now = self.now.max(due);
            self.fire(kind);
        }
        self.now = self.now.max(now);
    }

    /// Begin a session. Returns `false` (and changes nothing) if one is
    /// already running.
    pub fn start(&mut self, now: Duration) -> bool {
        self.advance_to(now);
        if self.state.active {
            return false;
        }
        let now = self.now;
        self.state.active = true;
        self.state.started_at = Some(now);
        self.state.hit_count = 0;
        self.state.target_reached = false;
        self.timers.arm_repeating(TimerKind::Tick, now, TICK_EVERY);
        self.reminder
            .arm(&mut self.timers, now, self.reminder_interval);
        self.target
            .arm(&mut self.timers, now, self.target_duration);
        log::info!(
            "focus session started (reminder every {}s, target {}s)",
            self.reminder_interval.as_secs(),
            self.target_duration.as_secs()
        );
        self.events.push(SessionEvent::Started {
            hit_count: self.state.hit_count,
        });
        true
    }

    /// End the session, cancelling every timer. Returns a summary if a
    /// session was running.
    pub fn stop(&mut self, now: Duration) -> Option<SessionSummary> {
        self.advance_to(now);
        self.stop_at_current_time()
    }

    pub fn toggle(&mut self, now: Duration) -> bool {
        if self.state.active {
            self.stop(now);
        } else {
            self.start(now);
        }
        self.state.active
    }

    /// The user clicked the character. Returns `false` if there was nothing
    /// on screen to click.
    pub fn register_hit(&mut self, now: Duration) -> bool {
        self.advance_to(now);
        if !self.state.active || !self.reminder.is_shown() {
            return false;
        }
        let position = self.animator.motion().current();
        self.state.hit_count = self.state.hit_count.saturating_add(1);
        self.hide_character();
        self.events.push(SessionEvent::Hit {
            hit_count: self.state.hit_count,
            position,
        });
        self.reminder.disarm(&mut self.timers);
        self.reminder
            .arm(&mut self.timers, self.now, self.reminder_interval);
        true
    }

    /// Celebrate the target and schedule the automatic stop. Ignored when no
    /// session is running.
    pub fn on_target_reached(&mut self, now: Duration) {
        self.advance_to(now);
        self.reach_target();
    }

    /// New reminder interval; a running session hides the character and
    /// restarts the countdown.
    pub fn set_reminder_interval(&mut self, now: Duration, interval: Duration) {
        self.advance_to(now);
        self.reminder_interval = interval;
        if self.state.active {
            self.hide_character();
            self.reminder.disarm(&mut self.timers);
            self.reminder.arm(&mut self.timers, self.now, interval);
        }
    }

    /// New target; takes effect from the next session.
    pub fn set_target_duration(&mut self, target: Duration) {
        self.target_duration = target;
    }

    fn fire(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Tick => {
                if let Some(elapsed_secs) = self.elapsed_secs(self.now) {
                    self.events.push(SessionEvent::Tick { elapsed_secs });
                }
            }
            TimerKind::Reminder => self.show_character(),
            TimerKind::Target => self.reach_target(),
            TimerKind::AutoStop => {
                if self.state.active {
                    log::info!("target reached, ending session");
                    self.stop_at_current_time();
                }
            }
            TimerKind::Movement => {
                if let Some((position, facing_deg)) =
                    self.animator
                        .step(&mut self.timers, &self.viewport, self.rng.as_mut())
                {
                    self.events.push(SessionEvent::CharacterMoved {
                        position,
                        facing_deg,
                    });
                }
            }
            TimerKind::MovementWindow => self.animator.halt(&mut self.timers),
        }
    }

    fn show_character(&mut self) {
        if !self.state.active || !self.reminder.fire() {
            return;
        }
        let position = self.viewport.random_position(self.rng.as_mut());
        self.animator.start(&mut self.timers, self.now, position);
        log::debug!("character shown at ({:.0}, {:.0})", position.x, position.y);
        self.events.push(SessionEvent::CharacterShown { position });
    }

    fn hide_character(&mut self) {
        if self.animator.hide(&mut self.timers) {
            self.events.push(SessionEvent::CharacterHidden);
        }
    }

    fn reach_target(&mut self) {
        if !self.state.active {
            return;
        }
        self.state.target_reached = true;
        self.events.push(SessionEvent::TargetReached {
            target_secs: self.target_duration.as_secs(),
        });
        self.target.schedule_auto_stop(&mut self.timers, self.now);
    }

    fn stop_at_current_time(&mut self) -> Option<SessionSummary> {
        self.timers.cancel_all();
        self.reminder.disarm(&mut self.timers);
        self.target.cancel(&mut self.timers);
        let summary = match (self.state.active, self.state.started_at) {
            (true, Some(started)) => {
                let session_secs = self.now.saturating_sub(started).as_secs();
                self.state.cumulative_focused_secs =
                    self.state.cumulative_focused_secs.saturating_add(session_secs);
                if !self.state.target_reached && session_secs >= ENCOURAGEMENT_MIN_SECS {
                    self.events.push(SessionEvent::Encouragement { session_secs });
                }
                Some(SessionSummary {
                    session_secs,
                    total_focused_secs: self.state.cumulative_focused_secs,
                    hit_count: self.state.hit_count,
                    target_reached: self.state.target_reached,
                })
            }
            _ => None,
        };
        self.hide_character();
        self.state.active = false;
        self.state.started_at = None;
        if let Some(summary) = &summary {
            log::info!(
                "focus session stopped after {}s ({} hits)",
                summary.session_secs,
                summary.hit_count
            );
            self.events.push(SessionEvent::Stopped {
                session_secs: summary.session_secs,
                total_focused_secs: summary.total_focused_secs,
            });
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::tests::ScriptedRandom;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn session(interval: u32, target: u32) -> FocusSession {
        let settings = Settings {
            reminder_interval_secs: interval,
            target_duration_secs: target,
            ..Settings::default()
        };
        FocusSession::new(
            &settings,
            Viewport::new(1100.0, 700.0),
            Box::new(ScriptedRandom::new(&[0.25, 0.5, 0.75, 0.1, 0.9])),
        )
    }

    fn count<F: Fn(&SessionEvent) -> bool>(events: &[SessionEvent], pred: F) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn start_is_idempotent() {
        let mut s = session(30, 600);
        assert!(s.start(secs(5)));
        assert!(!s.start(secs(7)));
        assert_eq!(s.state().started_at, Some(secs(5)));
        assert_eq!(s.state().hit_count, 0);
        let live = s.timers().live_count();
        assert_eq!(live, 3);
    }

    #[test]
    fn ticks_report_elapsed_seconds() {
        let mut s = session(30, 600);
        s.start(secs(0));
        s.advance_to(secs(3));
        let ticks: Vec<_> = s
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Tick { elapsed_secs } => Some(elapsed_secs),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![1, 2, 3]);
    }

    #[test]
    fn reminder_shows_character_exactly_once() {
        let mut s = session(30, 600);
        s.start(secs(0));
        s.advance_to(Duration::from_millis(29_999));
        assert!(matches!(s.reminder_state(), ReminderState::Waiting { .. }));
        assert!(!s.character().is_visible());

        s.advance_to(secs(30));
        assert_eq!(s.reminder_state(), ReminderState::Shown);
        s.advance_to(secs(200));
        let events = s.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, SessionEvent::CharacterShown { .. })),
            1
        );
    }

    #[test]
    fn character_moves_four_times_within_window() {
        let mut s = session(10, 600);
        s.start(secs(0));
        s.advance_to(secs(10));
        assert!(s.is_character_moving());
        s.advance_to(secs(40));
        let events = s.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, SessionEvent::CharacterMoved { .. })),
            4
        );
        assert!(!s.is_character_moving());
        assert!(s.character().is_visible());
    }

    #[test]
    fn hit_rearms_reminder_and_counts() {
        let mut s = session(30, 600);
        s.start(secs(0));
        s.advance_to(secs(31));
        assert!(s.register_hit(secs(33)));
        assert_eq!(s.state().hit_count, 1);
        assert_eq!(
            s.reminder_state(),
            ReminderState::Waiting { due: secs(63) }
        );
        assert!(!s.character().is_visible());
        assert!(!s.is_character_moving());
        assert!(!s.register_hit(secs(34)), "nothing on screen to click");
        assert_eq!(s.state().hit_count, 1);
    }

    #[test]
    fn target_celebrates_then_auto_stops() {
        let mut s = session(600, 60);
        s.start(secs(0));
        s.advance_to(secs(60));
        assert!(s.state().target_reached);
        assert!(s.is_active());
        s.advance_to(Duration::from_millis(61_999));
        assert!(s.is_active());
        s.advance_to(secs(62));
        assert!(!s.is_active());
        let events = s.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, SessionEvent::TargetReached { .. })),
            1
        );
        assert!(events.contains(&SessionEvent::Stopped {
            session_secs: 62,
            total_focused_secs: 62
        }));
        assert_eq!(
            count(&events, |e| matches!(e, SessionEvent::Encouragement { .. })),
            0
        );
        assert_eq!(s.timers().live_count(), 0);
    }

    #[test]
    fn encouragement_only_for_long_sessions() {
        let mut s = session(600, 3600);
        s.start(secs(0));
        let summary = s.stop(secs(65)).expect("running session");
        assert_eq!(summary.session_secs, 65);
        let events = s.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, SessionEvent::Encouragement { session_secs: 65 })),
            1
        );

        s.start(secs(100));
        s.stop(secs(145));
        let events = s.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, SessionEvent::Encouragement { .. })),
            0
        );
        assert_eq!(s.state().cumulative_focused_secs, 110);
    }

    #[test]
    fn stop_when_idle_is_harmless() {
        let mut s = session(30, 600);
        assert_eq!(s.stop(secs(10)), None);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn target_reached_ignored_when_inactive() {
        let mut s = session(30, 600);
        s.on_target_reached(secs(1));
        assert!(!s.state().target_reached);
        assert!(!s.timers().is_armed(TimerKind::AutoStop));
    }

    #[test]
    fn manual_stop_cancels_pending_auto_stop() {
        let mut s = session(600, 60);
        s.start(secs(0));
        s.advance_to(secs(61));
        s.stop(secs(61));
        s.start(secs(61));
        s.advance_to(secs(64));
        assert!(s.is_active(), "grace timer from the previous session must not fire");
    }

    #[test]
    fn changing_interval_restarts_countdown() {
        let mut s = session(30, 600);
        s.start(secs(0));
        s.advance_to(secs(31));
        assert!(s.character().is_visible());
        s.set_reminder_interval(secs(40), secs(15));
        assert!(!s.character().is_visible());
        assert_eq!(s.reminder_state(), ReminderState::Waiting { due: secs(55) });
    }

    #[test]
    fn restart_reports_reset_hit_count() {
        let mut s = session(5, 600);
        s.start(secs(0));
        s.advance_to(secs(5));
        assert!(s.register_hit(secs(6)));
        s.stop(secs(8));
        assert_eq!(s.state().hit_count, 1);
        s.drain_events();

        assert!(s.start(secs(10)));
        assert_eq!(s.state().hit_count, 0);
        assert_eq!(s.drain_events(), vec![SessionEvent::Started { hit_count: 0 }]);
    }

    #[test]
    fn stop_hides_moving_character() {
        let mut s = session(5, 600);
        s.start(secs(0));
        s.advance_to(secs(6));
        assert!(s.is_character_moving());
        assert!(s.character().is_visible());
        s.drain_events();

        s.stop(secs(7));
        let events = s.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, SessionEvent::CharacterHidden)),
            1
        );
        assert!(!s.is_character_moving());
        assert!(!s.character().is_visible());
        assert_eq!(s.character().facing_deg(), 0.0);
        assert!(matches!(events.last(), Some(SessionEvent::Stopped { .. })));
    }

    #[test]
    fn toggle_flips_focus_mode() {
        let mut s = session(30, 600);
        assert!(s.toggle(secs(0)));
        assert!(!s.toggle(secs(5)));
        assert_eq!(s.timers().live_count(), 0);
    }
}
