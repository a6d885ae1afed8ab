// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login-state gate for protected routes.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user attached to the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Middleware that requires a logged-in user.
///
/// Anonymous requests get `401`; the frontend redirects them to the login page.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = state.auth.current_user().ok_or_else(|| {
        tracing::debug!(path = %request.uri().path(), "Rejecting anonymous request");
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}
