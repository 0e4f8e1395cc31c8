// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

const MIN: u64 = 60;

#[yare::parameterized(
    plenty_left        = { 15 * MIN, false, CountdownState::Hidden },
    at_show_threshold  = { 10 * MIN, false, CountdownState::Hidden },
    just_inside_show   = { 10 * MIN - 1, false, CountdownState::Visible },
    at_warn_threshold  = { 5 * MIN, false, CountdownState::Visible },
    just_inside_warn   = { 5 * MIN - 1, false, CountdownState::Warning },
    nearly_out         = { 1, false, CountdownState::Warning },
    expired            = { 0, false, CountdownState::Warning },
    remembered_hidden  = { 90 * MIN, true, CountdownState::Hidden },
    remembered_visible = { 45 * MIN, true, CountdownState::Visible },
    remembered_warning = { 20 * MIN, true, CountdownState::Warning },
)]
fn countdown_thresholds(remaining_secs: u64, remember_me: bool, expected: CountdownState) {
    let state = countdown_state(Duration::from_secs(remaining_secs), remember_me);
    assert_eq!(state, expected);
}

#[test]
fn remembered_session_uses_scaled_thresholds() {
    // 15 minutes left: hidden for a short session's thresholds would be
    // wrong here, a remembered session is already in warning territory.
    let remaining = Duration::from_secs(15 * MIN);
    assert_eq!(countdown_state(remaining, false), CountdownState::Hidden);
    assert_eq!(countdown_state(remaining, true), CountdownState::Warning);
}

#[test]
fn notice_hidden_above_five_minutes() {
    let mut notice = ExpiryNotice::new();
    assert!(!notice.visible(Duration::from_secs(6 * MIN)));
    // The five-minute boundary is exclusive.
    assert!(!notice.visible(Duration::from_secs(5 * MIN)));
    assert!(notice.visible(Duration::from_secs(5 * MIN - 1)));
}

#[test]
fn notice_threshold_ignores_remember_me_scaling() {
    // Unlike the countdown, the notice appears below five minutes for
    // every session; there is no widened window to test, only the fixed
    // boundary.
    let mut notice = ExpiryNotice::new();
    assert!(notice.visible(Duration::from_secs(4 * MIN)));
}

#[test]
fn dismiss_hides_until_session_extended() {
    let mut notice = ExpiryNotice::new();
    assert!(notice.visible(Duration::from_secs(3 * MIN)));

    notice.dismiss();
    assert!(!notice.visible(Duration::from_secs(3 * MIN)));
    assert!(!notice.visible(Duration::from_secs(MIN)));

    // Renewal pushed the expiry out; the dismissal resets.
    assert!(!notice.visible(Duration::from_secs(14 * MIN)));
    assert!(notice.visible(Duration::from_secs(4 * MIN)));
}

#[test]
fn dismiss_before_visibility_still_resets_on_extension() {
    let mut notice = ExpiryNotice::new();
    notice.dismiss();
    assert!(!notice.visible(Duration::from_secs(2 * MIN)));
    assert!(!notice.visible(Duration::from_secs(10 * MIN)));
    assert!(notice.visible(Duration::from_secs(2 * MIN)));
}
