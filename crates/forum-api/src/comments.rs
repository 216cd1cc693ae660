use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use forum_db::Database;
use forum_types::api::CreateCommentRequest;
use forum_types::models::Comment;

use crate::convert;
use crate::error::{HttpError, ServiceError};
use crate::posts::post_id;
use crate::state::{AppState, run_blocking};
use crate::validation::require_text;

/// Number of comments returned per post.
pub const COMMENT_LIMIT: u32 = 10;

pub const DEFAULT_TOPIC: &str = "general";

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Any registered user may comment on an existing post. A missing or
    /// blank topic falls back to `DEFAULT_TOPIC`.
    pub fn create_comment(
        &self,
        post_id: i64,
        body: &str,
        username: &str,
        topic: Option<&str>,
    ) -> Result<(), ServiceError> {
        if body.trim().is_empty() || username.trim().is_empty() {
            return Err(ServiceError::validation("Username and body are required"));
        }

        let user_id = self
            .db
            .get_user_id_by_username(username)?
            .ok_or(ServiceError::UnknownUser)?;

        let topic = topic
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TOPIC);

        // A user removed between the lookup and the insert is tolerated;
        // the post check is folded into the insert itself.
        let id = self
            .db
            .insert_comment(post_id, user_id, body, topic)?
            .ok_or_else(|| ServiceError::not_found("Post not found"))?;

        info!("User {} commented on post {} ({})", user_id, post_id, id);
        Ok(())
    }

    pub fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, ServiceError> {
        let rows = self.db.get_comments(post_id, COMMENT_LIMIT)?;
        Ok(rows.into_iter().map(convert::comment).collect())
    }
}

/// GET /api/posts/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let id = post_id(path)?;

    let comments = run_blocking(move || state.comments.list_comments(id)).await?;

    Ok(Json(comments))
}

/// POST /api/posts/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let id = post_id(path)?;
    let Json(req) = body.map_err(|e| HttpError::bad_request(e.body_text()))?;

    run_blocking(move || {
        state
            .comments
            .create_comment(id, &req.body, &req.username, req.topic.as_deref())
    })
    .await?;

    Ok(StatusCode::CREATED)
}
