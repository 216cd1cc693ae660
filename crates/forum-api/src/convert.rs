use chrono::{DateTime, Utc};
use tracing::warn;

use forum_db::models::{CommentRow, FeedRow, PostRow, UserRow};
use forum_types::models::{Comment, FeedPost, Post, User};

/// Parses a stored timestamp. Rows written by this crate are RFC 3339; the
/// plain `datetime('now')` form is accepted for rows inserted by hand.
fn parse_timestamp(raw: &str, what: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {} {}: {}", raw, what, id, e);
            DateTime::default()
        })
}

pub(crate) fn user(row: UserRow) -> User {
    User {
        created_at: parse_timestamp(&row.created_at, "user", row.id),
        id: row.id,
        username: row.username,
    }
}

pub(crate) fn post(row: PostRow) -> Post {
    Post {
        created_at: parse_timestamp(&row.created_at, "post", row.id),
        updated_at: parse_timestamp(&row.updated_at, "post", row.id),
        id: row.id,
        title: row.title,
        body: row.body,
        topic: row.topic,
        user_id: row.user_id,
    }
}

pub(crate) fn feed_post(row: FeedRow) -> FeedPost {
    FeedPost {
        post: post(row.post),
        username: row.username,
    }
}

pub(crate) fn comment(row: CommentRow) -> Comment {
    Comment {
        created_at: parse_timestamp(&row.created_at, "comment", row.id),
        id: row.id,
        body: row.body,
        topic: row.topic,
        user_id: row.user_id,
        post_id: row.post_id,
        username: row.username,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_stored_and_sqlite_formats() {
        let ts = parse_timestamp("2026-03-01T10:20:30.123456Z", "post", 1);
        assert_eq!((ts.year(), ts.hour(), ts.nanosecond()), (2026, 10, 123_456_000));

        let ts = parse_timestamp("2026-03-01 10:20:30", "post", 1);
        assert_eq!((ts.month(), ts.minute(), ts.second()), (3, 20, 30));
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_epoch() {
        assert_eq!(parse_timestamp("yesterday", "post", 1), DateTime::<Utc>::default());
    }
}
