use serde::Deserialize;

// -- Users --

/// Body of both `/api/register` and `/api/login`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRequest {
    pub username: String,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    pub topic: String,
    pub user_id: i64,
}

/// The owner is identified by the `user_id` query parameter, not the body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub title: String,
    pub body: String,
    pub topic: String,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub body: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub username: String,
}
