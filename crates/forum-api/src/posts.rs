use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};

use forum_db::Database;
use forum_types::api::{CreatePostRequest, UpdatePostRequest};
use forum_types::models::{FeedPost, Post};

use crate::convert;
use crate::error::{HttpError, ServiceError};
use crate::state::{AppState, run_blocking};
use crate::validation::{parse_user_id, require_text};

/// Number of posts returned by the feed.
pub const FEED_LIMIT: u32 = 10;

const NOT_FOUND_OR_NOT_OWNER: &str = "Post not found or you don't have permission to modify it";

/// `?user_id=` on owner-scoped routes. Parsed by hand so a missing value
/// and a malformed one get distinct messages.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
}

impl PostService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create_post(
        &self,
        title: &str,
        body: &str,
        topic: &str,
        user_id: i64,
    ) -> Result<Post, ServiceError> {
        validate_fields(title, body, topic)?;
        if user_id <= 0 {
            return Err(ServiceError::validation("Valid user_id is required"));
        }

        let row = self
            .db
            .insert_post(title, body, topic, user_id)?
            .ok_or(ServiceError::UnknownUser)?;

        info!("User {} created post {}", user_id, row.id);
        Ok(convert::post(row))
    }

    /// Newest first. Fails when the user does not exist.
    pub fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, ServiceError> {
        if !self.db.user_exists(user_id)? {
            return Err(ServiceError::UnknownUser);
        }

        let rows = self.db.get_posts_by_user(user_id)?;
        Ok(rows.into_iter().map(convert::post).collect())
    }

    /// The `FEED_LIMIT` most recent posts across all users.
    pub fn list_feed(&self) -> Result<Vec<FeedPost>, ServiceError> {
        let rows = self.db.get_feed(FEED_LIMIT)?;
        Ok(rows.into_iter().map(convert::feed_post).collect())
    }

    /// Missing and not-owned posts fail identically.
    pub fn update_post(
        &self,
        id: i64,
        title: &str,
        body: &str,
        topic: &str,
        user_id: i64,
    ) -> Result<Post, ServiceError> {
        validate_fields(title, body, topic)?;

        let row = self
            .db
            .update_post(id, user_id, title, body, topic)?
            .ok_or_else(|| {
                warn!("Update of post {} by user {} matched no row", id, user_id);
                ServiceError::not_found(NOT_FOUND_OR_NOT_OWNER)
            })?;

        Ok(convert::post(row))
    }

    pub fn delete_post(&self, id: i64, user_id: i64) -> Result<(), ServiceError> {
        if !self.db.delete_post(id, user_id)? {
            warn!("Delete of post {} by user {} matched no row", id, user_id);
            return Err(ServiceError::not_found(NOT_FOUND_OR_NOT_OWNER));
        }

        info!("User {} deleted post {}", user_id, id);
        Ok(())
    }
}

fn validate_fields(title: &str, body: &str, topic: &str) -> Result<(), ServiceError> {
    require_text(title, "Title")?;
    require_text(body, "Body")?;
    require_text(topic, "Topic")
}

pub(crate) fn post_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, HttpError> {
    path.map(|Path(id)| id)
        .map_err(|_| HttpError::bad_request("Invalid post ID"))
}

/// GET /api/posts?user_id=
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_user_id(query.user_id.as_deref())?;

    let posts = run_blocking(move || state.posts.list_posts_by_user(user_id)).await?;

    Ok(Json(posts))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = body.map_err(|e| HttpError::bad_request(e.body_text()))?;

    let post = run_blocking(move || {
        state
            .posts
            .create_post(&req.title, &req.body, &req.topic, req.user_id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/feed
pub async fn feed(State(state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let posts = run_blocking(move || state.posts.list_feed()).await?;
    Ok(Json(posts))
}

/// PUT /api/posts/{id}?user_id=
pub async fn update_post(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    Query(query): Query<OwnerQuery>,
    body: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let id = post_id(path)?;
    let Json(req) = body.map_err(|e| HttpError::bad_request(e.body_text()))?;
    // Field errors are reported before a missing owner.
    validate_fields(&req.title, &req.body, &req.topic)?;
    let user_id = parse_user_id(query.user_id.as_deref())?;

    let post = run_blocking(move || {
        state
            .posts
            .update_post(id, &req.title, &req.body, &req.topic, user_id)
    })
    .await?;

    Ok(Json(post))
}

/// DELETE /api/posts/{id}?user_id=
pub async fn delete_post(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let id = post_id(path)?;
    let user_id = parse_user_id(query.user_id.as_deref())?;

    run_blocking(move || state.posts.delete_post(id, user_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
