use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;
use crate::{comments, posts, users};

/// All forum routes. Cross-cutting layers (CORS, tracing, panic recovery)
/// are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/api/login", post(users::login))
        .route("/api/register", post(users::register))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/api/posts/{id}",
            put(posts::update_post).delete(posts::delete_post),
        )
        .route("/api/feed", get(posts::feed))
        .route(
            "/api/posts/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .with_state(state)
}

async fn hello() -> &'static str {
    "Hello from the backend!"
}
