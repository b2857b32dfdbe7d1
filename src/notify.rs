//! User-facing notices derived from session events.

use std::time::Duration;

use crate::session::SessionEvent;

pub const TOAST_DISMISS: Duration = Duration::from_secs(3);
pub const CELEBRATION_DISMISS: Duration = Duration::from_secs(5);
pub const CLICK_EFFECT_DISMISS: Duration = Duration::from_secs(1);

// Celebration chime.
pub const CHIME_HZ: f32 = 800.0;
pub const CHIME_GAIN: f32 = 0.1;
pub const CHIME_SECS: f64 = 0.2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Transient toast.
    Success(String),
    Encouragement(String),
    /// Full-screen overlay plus chime.
    Celebration { headline: String, detail: String },
}

impl Notice {
    pub fn dismiss_after(&self) -> Duration {
        match self {
            Notice::Celebration { .. } => CELEBRATION_DISMISS,
            Notice::Success(_) | Notice::Encouragement(_) => TOAST_DISMISS,
        }
    }
}

/// "30 min", "1 h", "1 h 30 min".
pub fn target_text(secs: u64) -> String {
    let minutes = secs / 60;
    if minutes >= 60 {
        let rest = minutes % 60;
        if rest > 0 {
            format!("{} h {} min", minutes / 60, rest)
        } else {
            format!("{} h", minutes / 60)
        }
    } else {
        format!("{minutes} min")
    }
}

/// "2 min 5 s", "2 min", "45 s".
pub fn elapsed_text(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    match (minutes, seconds) {
        (0, s) => format!("{s} s"),
        (m, 0) => format!("{m} min"),
        (m, s) => format!("{m} min {s} s"),
    }
}

/// Reading clock, "MM:SS".
pub fn clock_text(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Notices an event produces, in display order.
pub fn notices_for(event: &SessionEvent) -> Vec<Notice> {
    match event {
        SessionEvent::TargetReached { target_secs } => vec![
            Notice::Celebration {
                headline: "🎉 Focus goal complete!".to_string(),
                detail: "Your focus keeps getting stronger.".to_string(),
            },
            Notice::Success(format!(
                "🎉 Congratulations! You reached your {} focus goal!",
                target_text(*target_secs)
            )),
        ],
        SessionEvent::Encouragement { session_secs } => vec![Notice::Encouragement(format!(
            "💪 You focused for {}, keep going!",
            elapsed_text(*session_secs)
        ))],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_text_formats() {
        assert_eq!(target_text(300), "5 min");
        assert_eq!(target_text(3600), "1 h");
        assert_eq!(target_text(5400), "1 h 30 min");
    }

    #[test]
    fn elapsed_text_formats() {
        assert_eq!(elapsed_text(45), "45 s");
        assert_eq!(elapsed_text(120), "2 min");
        assert_eq!(elapsed_text(65), "1 min 5 s");
    }

    #[test]
    fn clock_pads() {
        assert_eq!(clock_text(0), "00:00");
        assert_eq!(clock_text(605), "10:05");
    }

    #[test]
    fn events_map_to_notices() {
        let notices = notices_for(&SessionEvent::TargetReached { target_secs: 1800 });
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].dismiss_after(), CELEBRATION_DISMISS);
        assert!(matches!(&notices[1], Notice::Success(msg) if msg.contains("30 min")));

        let notices = notices_for(&SessionEvent::Encouragement { session_secs: 65 });
        assert_eq!(
            notices,
            vec![Notice::Encouragement(
                "💪 You focused for 1 min 5 s, keep going!".to_string()
            )]
        );
        assert!(notices_for(&SessionEvent::Started { hit_count: 0 }).is_empty());
    }
}
