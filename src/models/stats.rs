//! Aggregates over archived tracking sessions for the progress view.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::ArchivedSession;

/// Totals computed from `sessionHistory`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryStats {
    // ─── Totals ──────────────────────────────────────────────────
    pub total_sessions: u32,
    /// Sum of session durations (seconds)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_active_seconds: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_calories_burned: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_calories_consumed: u64,
    /// Water intake (ml)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_water_intake: u64,
    pub total_exercises: u32,

    // ─── Breakdown ───────────────────────────────────────────────
    /// Exercise count per exercise name
    pub exercises_by_name: HashMap<String, u32>,
    /// Session count per month ("YYYY-MM", by start time)
    pub sessions_by_month: HashMap<String, u32>,
}

impl HistoryStats {
    /// Aggregate a whole history.
    pub fn from_history<'a>(history: impl IntoIterator<Item = &'a ArchivedSession>) -> Self {
        let mut stats = Self::default();
        for archived in history {
            stats.update_from_session(archived);
        }
        stats
    }

    /// Fold one archived session into the totals.
    pub fn update_from_session(&mut self, archived: &ArchivedSession) {
        let session = &archived.session;

        // Totals saturate on corrupt history.
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.total_active_seconds = self.total_active_seconds.saturating_add(session.duration);
        self.total_calories_burned = self
            .total_calories_burned
            .saturating_add(u64::from(session.calories_burned));
        self.total_calories_consumed = self
            .total_calories_consumed
            .saturating_add(u64::from(session.calories_consumed));
        self.total_water_intake = self
            .total_water_intake
            .saturating_add(u64::from(session.water_intake));

        for exercise in &session.exercises {
            self.total_exercises = self.total_exercises.saturating_add(1);
            let count = self
                .exercises_by_name
                .entry(exercise.name.clone())
                .or_insert(0);
            *count = count.saturating_add(1);
        }

        let month_key = session.start_time.format("%Y-%m").to_string();
        let count = self.sessions_by_month.entry(month_key).or_insert(0);
        *count = count.saturating_add(1);
    }
}
