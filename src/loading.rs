//! Busy-indicator state machine.
//!
//! A request that finishes within `delay` never shows an indicator. The timer
//! is plain data (a deadline plus a token), so the owner decides how time
//! advances: call [`LoadingIndicator::tick`] with the current instant, or
//! [`LoadingIndicator::fire`] with the token a scheduled callback was given.
//!
//! ```text
//!          start              tick(now >= show_at)
//!   Idle ────────→ PendingShow ───────────────────→ Showing
//!    ↑                  │ finish                       │ finish
//!    └──────────────────┴──────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

/// Identifies one scheduled show; stale tokens are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    Idle,
    PendingShow { show_at: Instant, token: TimerToken },
    Showing,
}

#[derive(Debug)]
pub struct LoadingIndicator {
    delay: Duration,
    state: LoadingState,
    next_token: u64,
}

impl LoadingIndicator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: LoadingState::Idle,
            next_token: 0,
        }
    }

    pub fn state(&self) -> LoadingState {
        self.state
    }

    pub fn is_showing(&self) -> bool {
        self.state == LoadingState::Showing
    }

    /// When the pending show is due, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            LoadingState::PendingShow { show_at, .. } => Some(show_at),
            _ => None,
        }
    }

    /// Enter the loading state. Only a transition out of `Idle` schedules a timer.
    pub fn start(&mut self, now: Instant) -> Option<TimerToken> {
        if self.state != LoadingState::Idle {
            return None;
        }
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.state = LoadingState::PendingShow {
            show_at: now + self.delay,
            token,
        };
        Some(token)
    }

    /// Leave the loading state, cancelling any pending show.
    pub fn finish(&mut self) {
        self.state = LoadingState::Idle;
    }

    /// Advance to `now`. Returns true when the indicator just became visible.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            LoadingState::PendingShow { show_at, .. } if now >= show_at => {
                self.state = LoadingState::Showing;
                true
            }
            _ => false,
        }
    }

    /// A timer callback fired. Returns true when the indicator just became visible.
    pub fn fire(&mut self, fired: TimerToken) -> bool {
        match self.state {
            LoadingState::PendingShow { token, .. } if token == fired => {
                self.state = LoadingState::Showing;
                true
            }
            _ => false,
        }
    }
}
