//! Database row types. These map directly to SQLite rows and stay
//! independent of the forum-types wire models; timestamps are kept as the
//! stored RFC 3339 strings.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub topic: String,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A post joined with its owner's username.
#[derive(Debug, Clone)]
pub struct FeedRow {
    pub post: PostRow,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub body: String,
    pub topic: String,
    pub user_id: i64,
    pub post_id: i64,
    pub username: String,
    pub created_at: String,
}
