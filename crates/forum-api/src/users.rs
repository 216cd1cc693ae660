use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use forum_db::Database;
use forum_types::api::UserRequest;
use forum_types::models::User;

use crate::convert;
use crate::error::{HttpError, ServiceError};
use crate::state::{AppState, run_blocking};
use crate::validation::require_text;

/// Username-only registration and login.
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn register(&self, username: &str) -> Result<User, ServiceError> {
        require_text(username, "Username")?;

        match self.db.insert_user(username)? {
            Some(row) => {
                info!("Registered user {} ({})", row.username, row.id);
                Ok(convert::user(row))
            }
            None => {
                warn!("User already exists: {}", username);
                Err(ServiceError::Conflict("User already exists".into()))
            }
        }
    }

    /// Looks the user up by exact username; never creates one.
    pub fn login(&self, username: &str) -> Result<User, ServiceError> {
        require_text(username, "Username")?;

        let row = self.db.get_user_by_username(username)?.ok_or_else(|| {
            warn!("Login failed - user not found: {}", username);
            ServiceError::UnknownUser
        })?;

        Ok(convert::user(row))
    }
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = body.map_err(|e| HttpError::bad_request(e.body_text()))?;

    let user = run_blocking(move || state.users.register(&req.username)).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = body.map_err(|e| HttpError::bad_request(e.body_text()))?;

    let user = run_blocking(move || state.users.login(&req.username))
        .await
        .map_err(|e| e.unknown_user_as(StatusCode::UNAUTHORIZED))?;

    Ok(Json(user))
}
