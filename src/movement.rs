//! Character movement: viewport sampling, facing angle, and the bounded
//! wander animation that runs while the character is on screen.

use serde::Serialize;
use std::time::Duration;

use crate::timers::{TimerKind, TimerSlots};

/// Footprint reserved at the right/bottom edges so the character stays fully
/// on screen.
pub const CHARACTER_MARGIN_PX: f64 = 100.0;
pub const MOVE_EVERY: Duration = Duration::from_secs(2);
pub const MOVEMENT_WINDOW: Duration = Duration::from_secs(10);
/// Moves shorter than this keep the previous heading (avoids jitter).
pub const MIN_TURN_DISTANCE_PX: f64 = 10.0;
/// The glyph's "head" points up; atan2 measures from the +x axis.
pub const HEADING_OFFSET_DEG: f64 = 90.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Visible area in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Uniform sample in `[0, width - margin) x [0, height - margin)`; a
    /// viewport smaller than the margin collapses to the origin on that axis.
    pub fn random_position(&self, rng: &mut dyn RandomSource) -> Position {
        let span_x = (self.width - CHARACTER_MARGIN_PX).max(0.0);
        let span_y = (self.height - CHARACTER_MARGIN_PX).max(0.0);
        Position::new(rng.next_unit() * span_x, rng.next_unit() * span_y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Randomness from the host (`crypto.getRandomValues` in the browser).
pub struct OsRandom {
    // Used only if the host source fails.
    fallback: u64,
}

impl OsRandom {
    pub fn new() -> Self {
        Self {
            fallback: 0x2545_f491_4f6c_dd1d,
        }
    }
}

impl Default for OsRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for OsRandom {
    fn next_unit(&mut self) -> f64 {
        let mut buf = [0u8; 8];
        let bits = match getrandom::getrandom(&mut buf) {
            Ok(()) => u64::from_le_bytes(buf),
            Err(err) => {
                log::warn!("host randomness unavailable ({err}); using fallback generator");
                self.fallback = self
                    .fallback
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                self.fallback
            }
        };
        // 53 significant bits map exactly onto [0, 1).
        (bits >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Heading in degrees, `[0, 360)`, for a move from `from` to `to`, or `None`
/// when the move is too short to turn for.
pub fn facing_angle(from: Position, to: Position) -> Option<f64> {
    if from.distance_to(to) < MIN_TURN_DISTANCE_PX {
        return None;
    }
    let raw = (to.y - from.y).atan2(to.x - from.x).to_degrees() + HEADING_OFFSET_DEG;
    Some(raw.rem_euclid(360.0))
}

/// Where the character is and which way it faces.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CharacterMotion {
    current: Position,
    previous: Position,
    facing_deg: f64,
    visible: bool,
}

impl CharacterMotion {
    pub fn current(&self) -> Position {
        self.current
    }

    pub fn previous(&self) -> Position {
        self.previous
    }

    pub fn facing_deg(&self) -> f64 {
        self.facing_deg
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn appear(&mut self, at: Position) {
        self.current = at;
        self.previous = at;
        self.visible = true;
    }

    /// Move to `next`, turning only if the move is long enough.
    pub fn step_to(&mut self, next: Position) -> f64 {
        self.previous = self.current;
        self.current = next;
        if let Some(angle) = facing_angle(self.previous, self.current) {
            self.facing_deg = angle;
        }
        self.facing_deg
    }

    fn hide(&mut self) {
        self.visible = false;
        self.facing_deg = 0.0;
    }
}

/// Runs the wander animation on the `Movement` and `MovementWindow` slots.
#[derive(Debug, Default)]
pub struct MovementAnimator {
    motion: CharacterMotion,
}

impl MovementAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion(&self) -> &CharacterMotion {
        &self.motion
    }

    pub fn is_moving(&self, timers: &TimerSlots) -> bool {
        timers.is_armed(TimerKind::Movement)
    }

    /// Show the character at `at` and start stepping every [`MOVE_EVERY`]
    /// until [`MOVEMENT_WINDOW`] elapses.
    pub fn start(&mut self, timers: &mut TimerSlots, now: Duration, at: Position) {
        self.motion.appear(at);
        timers.arm_repeating(TimerKind::Movement, now, MOVE_EVERY);
        timers.arm_once(TimerKind::MovementWindow, now, MOVEMENT_WINDOW);
    }

    /// One movement step; returns the new position and heading, or `None`
    /// if the character is no longer visible.
    pub fn step(
        &mut self,
        timers: &mut TimerSlots,
        viewport: &Viewport,
        rng: &mut dyn RandomSource,
    ) -> Option<(Position, f64)> {
        if !self.motion.visible {
            self.halt(timers);
            return None;
        }
        let next = viewport.random_position(rng);
        let facing = self.motion.step_to(next);
        Some((next, facing))
    }

    /// Stop moving but stay on screen.
    pub fn halt(&mut self, timers: &mut TimerSlots) {
        timers.cancel(TimerKind::Movement);
        timers.cancel(TimerKind::MovementWindow);
    }

    /// Stop moving and leave the screen. Returns whether it was visible.
    pub fn hide(&mut self, timers: &mut TimerSlots) -> bool {
        self.halt(timers);
        let was_visible = self.motion.visible;
        self.motion.hide();
        was_visible
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Replays a fixed list of samples, cycling when exhausted.
    pub(crate) struct ScriptedRandom {
        samples: Vec<f64>,
        next: usize,
    }

    impl ScriptedRandom {
        pub(crate) fn new(samples: &[f64]) -> Self {
            Self {
                samples: samples.to_vec(),
                next: 0,
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn next_unit(&mut self) -> f64 {
            let value = self.samples[self.next % self.samples.len()];
            self.next += 1;
            value
        }
    }

    #[test]
    fn facing_right_is_ninety_degrees() {
        let angle = facing_angle(Position::new(0.0, 0.0), Position::new(10.0, 0.0));
        assert_eq!(angle, Some(90.0));
    }

    #[test]
    fn facing_down_is_one_eighty_degrees() {
        let angle = facing_angle(Position::new(0.0, 0.0), Position::new(0.0, 10.0)).unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn facing_up_and_left_normalize_into_range() {
        let up = facing_angle(Position::new(0.0, 0.0), Position::new(0.0, -50.0)).unwrap();
        assert!(up.min(360.0 - up) < 1e-9);
        let left = facing_angle(Position::new(0.0, 0.0), Position::new(-50.0, 0.0)).unwrap();
        assert!((left - 270.0).abs() < 1e-9);
        let up_left = facing_angle(Position::new(0.0, 0.0), Position::new(-30.0, -30.0)).unwrap();
        assert!((up_left - 315.0).abs() < 1e-9);
    }

    #[test]
    fn short_move_keeps_previous_heading() {
        let mut motion = CharacterMotion::default();
        motion.appear(Position::new(0.0, 0.0));
        assert_eq!(motion.step_to(Position::new(10.0, 0.0)), 90.0);
        let kept = motion.step_to(Position::new(15.0, 0.0));
        assert_eq!(kept, 90.0);
        assert_eq!(motion.previous(), Position::new(10.0, 0.0));
        assert_eq!(motion.current(), Position::new(15.0, 0.0));
    }

    #[test]
    fn random_position_respects_margin() {
        let viewport = Viewport::new(500.0, 300.0);
        let mut rng = ScriptedRandom::new(&[0.0, 0.999_999]);
        let pos = viewport.random_position(&mut rng);
        assert_eq!(pos.x, 0.0);
        assert!(pos.y < 200.0 && pos.y > 199.0);

        let tiny = Viewport::new(50.0, 50.0);
        assert_eq!(tiny.random_position(&mut rng), Position::new(0.0, 0.0));
    }

    #[test]
    fn os_random_stays_in_unit_interval() {
        let mut rng = OsRandom::new();
        for _ in 0..100 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn hide_stops_movement_and_resets_rotation() {
        let mut timers = TimerSlots::new();
        let mut animator = MovementAnimator::new();
        let mut rng = ScriptedRandom::new(&[0.1, 0.1, 0.9, 0.9]);
        let viewport = Viewport::new(1100.0, 1100.0);

        animator.start(&mut timers, Duration::ZERO, Position::new(0.0, 0.0));
        assert!(animator.is_moving(&timers));
        assert!(timers.is_armed(TimerKind::MovementWindow));

        let (_, facing) = animator.step(&mut timers, &viewport, &mut rng).unwrap();
        assert!(facing != 0.0);

        assert!(animator.hide(&mut timers));
        assert!(!animator.is_moving(&timers));
        assert!(!timers.is_armed(TimerKind::MovementWindow));
        assert_eq!(animator.motion().facing_deg(), 0.0);
        assert!(animator.step(&mut timers, &viewport, &mut rng).is_none());
    }
}
