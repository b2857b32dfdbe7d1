//! Reminder scheduler: decides when the character next appears.

use std::time::Duration;

use crate::timers::{TimerKind, TimerSlots};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReminderState {
    /// Nothing pending.
    Idle,
    /// Character appears at `due`.
    Waiting { due: Duration },
    /// Character on screen, waiting for a click.
    Shown,
}

#[derive(Debug)]
pub struct ReminderScheduler {
    state: ReminderState,
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self {
            state: ReminderState::Idle,
        }
    }
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReminderState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.state == ReminderState::Shown
    }

    /// Schedule the next appearance `interval` from `now`. Any pending
    /// reminder is replaced.
    pub fn arm(&mut self, timers: &mut TimerSlots, now: Duration, interval: Duration) {
        timers.arm_once(TimerKind::Reminder, now, interval);
        let due = now.saturating_add(interval);
        log::debug!("reminder armed for {:.1}s", due.as_secs_f64());
        self.state = ReminderState::Waiting { due };
    }

    pub fn disarm(&mut self, timers: &mut TimerSlots) {
        timers.cancel(TimerKind::Reminder);
        self.state = ReminderState::Idle;
    }

    /// Reminder timer fired. Returns `true` if this moved WAITING to SHOWN.
    pub fn fire(&mut self) -> bool {
        match self.state {
            ReminderState::Waiting { .. } => {
                self.state = ReminderState::Shown;
                true
            }
            ReminderState::Idle | ReminderState::Shown => false,
        }
    }
}
