// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiry display state, derived from remaining token lifetime. Pure
//! state machines so the rendering layer stays a straight projection.

use std::time::Duration;

const SHOW_BELOW: Duration = Duration::from_secs(10 * 60);
const WARN_BELOW: Duration = Duration::from_secs(5 * 60);
const SHOW_BELOW_REMEMBERED: Duration = Duration::from_secs(60 * 60);
const WARN_BELOW_REMEMBERED: Duration = Duration::from_secs(30 * 60);

/// Notices appear below five minutes regardless of "remember me".
const NOTICE_BELOW: Duration = Duration::from_secs(5 * 60);

/// Persistent countdown display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Hidden,
    Visible,
    Warning,
}

/// Countdown state for the given remaining lifetime. "Remember me"
/// sessions are long lived, so their thresholds scale up to stay
/// proportionally early.
pub fn countdown_state(remaining: Duration, remember_me: bool) -> CountdownState {
    let (show, warn) = if remember_me {
        (SHOW_BELOW_REMEMBERED, WARN_BELOW_REMEMBERED)
    } else {
        (SHOW_BELOW, WARN_BELOW)
    };
    if remaining < warn {
        CountdownState::Warning
    } else if remaining < show {
        CountdownState::Visible
    } else {
        CountdownState::Hidden
    }
}

/// Dismissible "session expiring soon" notice with an extend action.
///
/// Dismissal only holds for the current approach to expiry: once remaining
/// time rises back above the threshold (the session was extended), the
/// dismissal resets so the next approach shows the notice again.
#[derive(Debug, Default)]
pub struct ExpiryNotice {
    dismissed: bool,
}

impl ExpiryNotice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the notice should be shown for the given remaining lifetime.
    /// Resets the dismissal latch whenever remaining time is above the
    /// threshold.
    pub fn visible(&mut self, remaining: Duration) -> bool {
        if remaining >= NOTICE_BELOW {
            self.dismissed = false;
            return false;
        }
        !self.dismissed
    }

    /// Hide the notice until the session is next extended. Does not touch
    /// the renewal schedule.
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

#[cfg(test)]
#[path = "countdown_tests.rs"]
mod tests;
