// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod api;
pub mod countdown;
pub mod persist;
pub mod renew;
pub mod scheduler;
pub mod session;
pub mod test_support;
pub mod token;
