//! Timer slots for the focus session.
//!
//! Every logical timer (reminder, target, movement, ...) owns exactly one slot.
//! Arming a slot replaces whatever was pending in it, so a slot can never hold
//! two live timers. Nothing here sleeps or registers host callbacks: the owner
//! drives the table with [`TimerSlots::pop_due`] from its own clock, which is
//! `performance.now()` in the browser and a simulated clock in tests.

use std::collections::BTreeMap;
use std::time::Duration;

/// Logical timers. Declaration order doubles as the tie-break when two timers
/// are due at the same instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Grace period between target celebration and automatic stop.
    AutoStop,
    /// Target-duration achievement.
    Target,
    /// End of the bounded movement window; sorts before `Movement` so no
    /// step runs at the very instant the window closes.
    MovementWindow,
    /// Repeating character reposition.
    Movement,
    /// Character appearance after the reminder interval.
    Reminder,
    /// Repeating elapsed-time tick.
    Tick,
}

/// A pending timer in a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    pub due: Duration,
    /// `Some` for repeating timers.
    pub period: Option<Duration>,
}

// Zero periods would make a repeating timer fire forever within one advance.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
pub struct TimerSlots {
    slots: BTreeMap<TimerKind, Pending>,
}

impl TimerSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire once at `now + delay`, replacing any pending
    /// timer of the same kind. Returns the replaced timer, if any.
    pub fn arm_once(&mut self, kind: TimerKind, now: Duration, delay: Duration) -> Option<Pending> {
        let replaced = self.slots.insert(
            kind,
            Pending {
                due: now.saturating_add(delay),
                period: None,
            },
        );
        if replaced.is_some() {
            log::debug!("timer {kind:?} re-armed, previous handle cancelled");
        }
        replaced
    }

    /// Schedule `kind` to fire every `period`, first at `now + period`.
    pub fn arm_repeating(
        &mut self,
        kind: TimerKind,
        now: Duration,
        period: Duration,
    ) -> Option<Pending> {
        let period = period.max(MIN_PERIOD);
        self.slots.insert(
            kind,
            Pending {
                due: now.saturating_add(period),
                period: Some(period),
            },
        )
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.slots.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.slots.clear();
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn due_at(&self, kind: TimerKind) -> Option<Duration> {
        self.slots.get(&kind).map(|pending| pending.due)
    }

    pub fn live_count(&self) -> usize {
        self.slots.len()
    }

    /// Earliest due time across all slots.
    pub fn next_due(&self) -> Option<Duration> {
        self.slots.values().map(|pending| pending.due).min()
    }

    /// Remove (or reschedule, for repeating timers) the earliest timer due at
    /// or before `now`, returning its kind and the instant it was due.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerKind, Duration)> {
        let (kind, pending) = self
            .slots
            .iter()
            .filter(|(_, pending)| pending.due <= now)
            .min_by_key(|(kind, pending)| (pending.due, **kind))
            .map(|(kind, pending)| (*kind, *pending))?;
        match pending.period {
            Some(period) => {
                self.slots.insert(
                    kind,
                    Pending {
                        due: pending.due.saturating_add(period),
                        period: Some(period),
                    },
                );
            }
            None => {
                self.slots.remove(&kind);
            }
        }
        Some((kind, pending.due))
    }
}
