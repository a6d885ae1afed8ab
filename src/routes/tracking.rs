// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live tracking routes (login required).

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{ArchivedSession, ExerciseEntry, HistoryStats, TrackingSession};
use crate::AppState;

/// How many recent exercises the live view shows.
const RECENT_EXERCISES: usize = 3;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tracking/session", get(get_session))
        .route("/tracking/start", post(start))
        .route("/tracking/stop", post(stop))
        .route("/tracking/calories", post(record_calories))
        .route("/tracking/water", post(record_water))
        .route("/tracking/exercise", post(record_exercise))
        .route("/tracking/history", get(history))
        .route("/tracking/stats", get(stats))
}

/// Live session as shown by the tracking widget.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionView {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<TrackingSession>,
    /// `HH:MM:SS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,
    pub calories_burned_progress: u8,
    pub water_progress: u8,
    /// Newest first
    pub recent_exercises: Vec<ExerciseEntry>,
}

impl SessionView {
    fn new(session: Option<TrackingSession>) -> Self {
        match session {
            Some(session) => Self {
                active: true,
                elapsed: Some(session.elapsed_display()),
                calories_burned_progress: session.calories_burned_progress(),
                water_progress: session.water_progress(),
                recent_exercises: session.recent_exercises(RECENT_EXERCISES).cloned().collect(),
                session: Some(session),
            },
            None => Self {
                active: false,
                session: None,
                elapsed: None,
                calories_burned_progress: 0,
                water_progress: 0,
                recent_exercises: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AmountRequest {
    pub amount: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExerciseRequest {
    #[validate(length(min = 1, max = 100, message = "Exercise name must be 1 to 100 characters"))]
    pub name: String,
    /// Seconds
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration: u64,
    #[serde(default)]
    pub calories: u32,
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(SessionView::new(state.tracker.current()))
}

async fn start(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    // The ticker is owned by the tracker; shutdown cancels it.
    let _ticker = state.tracker.start();
    Json(SessionView::new(state.tracker.current()))
}

/// Stop tracking. Returns the archived session, or `null` when idle.
async fn stop(State(state): State<Arc<AppState>>) -> Json<Option<ArchivedSession>> {
    Json(state.tracker.stop())
}

async fn record_calories(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AmountRequest>,
) -> Json<SessionView> {
    state.tracker.record_calories(body.amount);
    Json(SessionView::new(state.tracker.current()))
}

async fn record_water(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AmountRequest>,
) -> Json<SessionView> {
    state.tracker.record_water(body.amount);
    Json(SessionView::new(state.tracker.current()))
}

async fn record_exercise(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<ExerciseRequest>,
) -> Result<Json<SessionView>> {
    body.name = body.name.trim().to_string();
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .tracker
        .record_exercise(&body.name, body.duration, body.calories);
    Ok(Json(SessionView::new(state.tracker.current())))
}

async fn history(State(state): State<Arc<AppState>>) -> Json<Vec<ArchivedSession>> {
    Json(state.tracker.history())
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<HistoryStats> {
    Json(state.tracker.stats())
}
