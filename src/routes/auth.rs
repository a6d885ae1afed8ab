// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Passcode login routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::models::{Contact, ContactType, User};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/verify", post(verify))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Body for starting a login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginRequest {
    pub contact: String,
    #[serde(default)]
    pub contact_type: ContactType,
}

/// Returned once a passcode has been issued.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    /// Masked contact for the "code sent to ..." prompt
    pub sent_to: String,
    pub contact_type: ContactType,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerifyRequest {
    pub contact: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerifyResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Masked contact of an in-flight login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_contact: Option<String>,
}

/// Issue a passcode for the given contact.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    state
        .auth
        .request_login(&body.contact, body.contact_type)
        .await?;

    let sent_to = Contact {
        value: body.contact.trim().to_string(),
        contact_type: body.contact_type,
    }
    .masked();

    Ok((
        StatusCode::ACCEPTED,
        Json(LoginResponse {
            sent_to,
            contact_type: body.contact_type,
        }),
    ))
}

/// Check a passcode. A wrong code is a normal `verified: false` answer.
async fn verify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    let verified = state.auth.verify(&body.contact, body.code.trim()).await;
    let user = verified.then(|| state.auth.current_user()).flatten();
    Json(VerifyResponse { verified, user })
}

async fn logout(State(state): State<Arc<AppState>>) -> StatusCode {
    state.auth.logout();
    StatusCode::NO_CONTENT
}

async fn me(State(state): State<Arc<AppState>>) -> Json<MeResponse> {
    let user = state.auth.current_user();
    let pending_contact = state.auth.pending_contact().map(|c| c.masked());
    Json(MeResponse {
        authenticated: user.is_some(),
        user,
        pending_contact,
    })
}
