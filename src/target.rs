//! Target-duration timer and the grace period before auto-stop.

use std::time::Duration;

use crate::timers::{TimerKind, TimerSlots};

/// Delay between the celebration and the automatic end of the session.
pub const AUTO_STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
pub struct TargetTimer {
    goal: Option<Duration>,
}

impl TargetTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Goal of the current session, if armed.
    pub fn goal(&self) -> Option<Duration> {
        self.goal
    }

    /// Armed once per session; hits and reminders never touch it.
    pub fn arm(&mut self, timers: &mut TimerSlots, now: Duration, goal: Duration) {
        timers.arm_once(TimerKind::Target, now, goal);
        self.goal = Some(goal);
    }

    pub fn schedule_auto_stop(&mut self, timers: &mut TimerSlots, now: Duration) {
        timers.arm_once(TimerKind::AutoStop, now, AUTO_STOP_GRACE);
    }

    pub fn cancel(&mut self, timers: &mut TimerSlots) {
        timers.cancel(TimerKind::Target);
        timers.cancel(TimerKind::AutoStop);
        self.goal = None;
    }
}
