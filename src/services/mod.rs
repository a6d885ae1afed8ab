// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod notify;
pub mod otp;
pub mod tracking;

pub use auth::{AuthFlow, AuthState};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use otp::{
    FixedDelay, FixedPasscode, LogPasscodeSender, NetworkDelay, NoDelay, PasscodeGenerator,
    PasscodeSender, RandomPasscode,
};
pub use tracking::SessionTracker;
