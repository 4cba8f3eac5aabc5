//! Attention flashing for sessions waiting on user input.
//!
//! A session that enters the waiting state blinks every [`FLASH_INTERVAL`]
//! for the configured duration, then stays lit. Leaving the waiting state
//! forgets it; entering again restarts the blink. A zero duration blinks
//! until the session stops waiting.
//!
//! Time is passed in by the caller, so the state machine has no timers of
//! its own.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use wtui_core::AssistantSession;

pub const FLASH_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_FLASH_DURATION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Not waiting.
    Off,
    FlashOn,
    FlashDim,
    /// Waiting, blink period over.
    Solid,
}

#[derive(Debug, Clone)]
pub struct FlashTracker {
    duration: Duration,
    waiting_since: HashMap<String, Instant>,
}

impl Default for FlashTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FLASH_DURATION)
    }
}

impl FlashTracker {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            waiting_since: HashMap::new(),
        }
    }

    /// Fold in a fresh session list.
    pub fn observe(&mut self, sessions: &[AssistantSession], now: Instant) {
        self.waiting_since.retain(|pane_id, _| {
            sessions
                .iter()
                .any(|s| &s.pane_id == pane_id && s.input_state.is_waiting())
        });
        for s in sessions.iter().filter(|s| s.input_state.is_waiting()) {
            self.waiting_since.entry(s.pane_id.clone()).or_insert(now);
        }
    }

    pub fn indicator(&self, pane_id: &str, now: Instant) -> Indicator {
        let Some(since) = self.waiting_since.get(pane_id) else {
            return Indicator::Off;
        };
        let elapsed = now.saturating_duration_since(*since);
        if !self.duration.is_zero() && elapsed >= self.duration {
            return Indicator::Solid;
        }
        let phase = elapsed.as_millis() / FLASH_INTERVAL.as_millis();
        if phase % 2 == 0 {
            Indicator::FlashOn
        } else {
            Indicator::FlashDim
        }
    }

    /// Whether any session is still blinking, i.e. the caller should keep
    /// re-rendering on a [`FLASH_INTERVAL`] cadence.
    pub fn is_animating(&self, now: Instant) -> bool {
        self.waiting_since.values().any(|since| {
            self.duration.is_zero() || now.saturating_duration_since(*since) < self.duration
        })
    }
}
