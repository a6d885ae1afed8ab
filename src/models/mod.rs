// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod session;
pub mod stats;
pub mod user;

pub use session::{ArchivedSession, ExerciseEntry, TrackingSession};
pub use stats::HistoryStats;
pub use user::{Contact, ContactType, User};
