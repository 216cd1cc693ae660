use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use forum_db::Database;

use crate::comments::CommentService;
use crate::error::ServiceError;
use crate::posts::PostService;
use crate::users::UserService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
}

impl AppStateInner {
    /// Builds every service around the same store.
    pub fn new(db: Arc<Database>) -> AppState {
        Arc::new(Self {
            users: UserService::new(db.clone()),
            posts: PostService::new(db.clone()),
            comments: CommentService::new(db),
        })
    }
}

/// Runs a blocking service call off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ServiceError::Internal(anyhow!("blocking task failed: {}", e))
    })?
}
