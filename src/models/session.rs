// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking session model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::{elapsed_seconds, format_elapsed};

/// Calories-burned goal shown against the live session.
pub const CALORIES_BURNED_GOAL: u32 = 500;
/// Water intake goal (ml) shown against the live session.
pub const WATER_INTAKE_GOAL_ML: u32 = 2000;

/// An exercise logged during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExerciseEntry {
    pub name: String,
    /// Seconds spent on the exercise
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration: u64,
    pub calories: u32,
    /// When the entry was captured
    pub timestamp: DateTime<Utc>,
}

/// The active tracking session.
///
/// Stored under `trackingSession` while tracking is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackingSession {
    pub start_time: DateTime<Utc>,
    /// Elapsed seconds since `start_time`, recomputed on every tick
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration: u64,
    #[serde(default)]
    pub calories_burned: u32,
    #[serde(default)]
    pub calories_consumed: u32,
    /// Water intake in ml
    #[serde(default)]
    pub water_intake: u32,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

impl TrackingSession {
    /// A fresh session with zeroed accumulators.
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            duration: 0,
            calories_burned: 0,
            calories_consumed: 0,
            water_intake: 0,
            exercises: Vec::new(),
        }
    }

    /// Recompute `duration` from the start time.
    pub fn refresh_duration(&mut self, now: DateTime<Utc>) {
        self.duration = elapsed_seconds(self.start_time, now);
    }

    /// Elapsed time as `HH:MM:SS`.
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.duration)
    }

    /// Calories burned as a percentage of [`CALORIES_BURNED_GOAL`], capped at 100.
    pub fn calories_burned_progress(&self) -> u8 {
        percent_of(self.calories_burned, CALORIES_BURNED_GOAL)
    }

    /// Water intake as a percentage of [`WATER_INTAKE_GOAL_ML`], capped at 100.
    pub fn water_progress(&self) -> u8 {
        percent_of(self.water_intake, WATER_INTAKE_GOAL_ML)
    }

    /// The last `n` exercises, newest first.
    pub fn recent_exercises(&self, n: usize) -> impl Iterator<Item = &ExerciseEntry> {
        self.exercises.iter().rev().take(n)
    }
}

fn percent_of(value: u32, goal: u32) -> u8 {
    let pct = (u64::from(value) * 100 / u64::from(goal.max(1))).min(100);
    u8::try_from(pct).unwrap_or(100)
}

/// A stopped session, appended to `sessionHistory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ArchivedSession {
    #[serde(flatten)]
    pub session: TrackingSession,
    pub end_time: DateTime<Utc>,
}
