use crate::models::{CommentRow, FeedRow, PostRow, UserRow};
use crate::{Database, timestamp_now};
use anyhow::Result;
use rusqlite::{Connection, Row};

const POST_COLUMNS: &str = "id, title, body, topic, user_id, created_at, updated_at";

impl Database {
    // -- Users --

    /// Inserts a new user. `None` means the username is already taken; the
    /// uniqueness check and the insert are one statement.
    pub fn insert_user(&self, username: &str) -> Result<Option<UserRow>> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            conn.query_row(
                "INSERT INTO users (username, created_at) VALUES (?1, ?2)
                 ON CONFLICT(username) DO NOTHING
                 RETURNING id, username, created_at",
                (username, &now),
                user_from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_id_by_username(&self, username: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    pub fn user_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    // -- Posts --

    /// Inserts a post owned by `user_id`. `None` means no such user.
    pub fn insert_post(
        &self,
        title: &str,
        body: &str,
        topic: &str,
        user_id: i64,
    ) -> Result<Option<PostRow>> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO posts (title, body, topic, user_id, created_at, updated_at)
                     SELECT ?1, ?2, ?3, ?4, ?5, ?5
                     WHERE EXISTS (SELECT 1 FROM users WHERE id = ?4)
                     RETURNING {POST_COLUMNS}"
                ),
                rusqlite::params![title, body, topic, user_id, now],
                post_from_row,
            )
            .optional()
        })
    }

    pub fn get_posts_by_user(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;

            let rows = stmt
                .query_map([user_id], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Most recent posts across all users, joined with the owner's username.
    pub fn get_feed(&self, limit: u32) -> Result<Vec<FeedRow>> {
        self.with_conn(|conn| query_feed(conn, limit))
    }

    /// Updates a post only when `id` exists and is owned by `user_id`.
    /// `None` covers both "missing" and "not yours".
    pub fn update_post(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        body: &str,
        topic: &str,
    ) -> Result<Option<PostRow>> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            conn.query_row(
                &format!(
                    "UPDATE posts SET title = ?1, body = ?2, topic = ?3, updated_at = ?4
                     WHERE id = ?5 AND user_id = ?6
                     RETURNING {POST_COLUMNS}"
                ),
                rusqlite::params![title, body, topic, now, id, user_id],
                post_from_row,
            )
            .optional()
        })
    }

    /// Returns whether a row owned by `user_id` was removed.
    pub fn delete_post(&self, id: i64, user_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute(
                "DELETE FROM posts WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(affected > 0)
        })
    }

    // -- Comments --

    /// Inserts a comment on `post_id`. `None` means no such post.
    pub fn insert_comment(
        &self,
        post_id: i64,
        user_id: i64,
        body: &str,
        topic: &str,
    ) -> Result<Option<i64>> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            conn.query_row(
                "INSERT INTO comments (body, topic, user_id, post_id, created_at)
                 SELECT ?1, ?2, ?3, ?4, ?5
                 WHERE EXISTS (SELECT 1 FROM posts WHERE id = ?4)
                 RETURNING id",
                rusqlite::params![body, topic, user_id, post_id, now],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn get_comments(&self, post_id: i64, limit: u32) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, post_id, limit))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Expects the columns in `POST_COLUMNS` order.
fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        topic: row.get(3)?,
        user_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, username, created_at FROM users WHERE username = ?1")?;

    stmt.query_row([username], user_from_row).optional()
}

fn query_feed(conn: &Connection, limit: u32) -> Result<Vec<FeedRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.title, p.body, p.topic, p.user_id, p.created_at, p.updated_at, u.username
         FROM posts p
         JOIN users u ON p.user_id = u.id
         ORDER BY p.created_at DESC, p.id DESC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(FeedRow {
                post: post_from_row(row)?,
                username: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_comments(conn: &Connection, post_id: i64, limit: u32) -> Result<Vec<CommentRow>> {
    // JOIN users to fetch the commenter's username in a single query
    let mut stmt = conn.prepare(
        "SELECT c.id, c.body, c.topic, c.user_id, c.post_id, u.username, c.created_at
         FROM comments c
         JOIN users u ON c.user_id = u.id
         WHERE c.post_id = ?1
         ORDER BY c.created_at DESC, c.id DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![post_id, limit], |row| {
            Ok(CommentRow {
                id: row.get(0)?,
                body: row.get(1)?,
                topic: row.get(2)?,
                user_id: row.get(3)?,
                post_id: row.get(4)?,
                username: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_user(username: &str) -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db.insert_user(username).unwrap().unwrap();
        (db, user.id)
    }

    #[test]
    fn duplicate_username_is_not_inserted() {
        let (db, id) = db_with_user("alice");

        assert!(db.insert_user("alice").unwrap().is_none());

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM users WHERE username = 'alice'", [], |r| {
                    r.get(0)
                })?)
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(db.get_user_id_by_username("alice").unwrap(), Some(id));
    }

    #[test]
    fn user_ids_increase() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_user("a").unwrap().unwrap();
        let b = db.insert_user("b").unwrap().unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn post_for_missing_user_is_not_inserted() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_post("t", "b", "go", 42).unwrap().is_none());
        assert!(db.get_feed(10).unwrap().is_empty());
    }

    #[test]
    fn new_post_has_equal_timestamps() {
        let (db, uid) = db_with_user("alice");
        let post = db.insert_post("t", "b", "go", uid).unwrap().unwrap();
        assert_eq!(post.created_at, post.updated_at);
        assert_eq!(post.user_id, uid);
    }

    #[test]
    fn update_requires_ownership() {
        let (db, alice) = db_with_user("alice");
        let bob = db.insert_user("bob").unwrap().unwrap().id;
        let post = db.insert_post("t", "b", "go", alice).unwrap().unwrap();

        assert!(db.update_post(post.id, bob, "x", "y", "z").unwrap().is_none());
        assert!(db.update_post(post.id + 1, alice, "x", "y", "z").unwrap().is_none());

        let updated = db.update_post(post.id, alice, "x", "y", "z").unwrap().unwrap();
        assert_eq!(updated.title, "x");
        assert_eq!(updated.created_at, post.created_at);
        assert!(updated.updated_at >= post.updated_at);
    }

    #[test]
    fn delete_requires_ownership() {
        let (db, alice) = db_with_user("alice");
        let bob = db.insert_user("bob").unwrap().unwrap().id;
        let post = db.insert_post("t", "b", "go", alice).unwrap().unwrap();

        assert!(!db.delete_post(post.id, bob).unwrap());
        assert_eq!(db.get_posts_by_user(alice).unwrap().len(), 1);

        assert!(db.delete_post(post.id, alice).unwrap());
        assert!(db.get_posts_by_user(alice).unwrap().is_empty());
        assert!(!db.delete_post(post.id, alice).unwrap());
    }

    #[test]
    fn deleting_a_post_removes_its_comments() {
        let (db, alice) = db_with_user("alice");
        let post = db.insert_post("t", "b", "go", alice).unwrap().unwrap();
        db.insert_comment(post.id, alice, "hi", "general").unwrap().unwrap();

        assert!(db.delete_post(post.id, alice).unwrap());
        assert!(db.get_comments(post.id, 10).unwrap().is_empty());
    }

    #[test]
    fn feed_is_limited_and_newest_first() {
        let (db, alice) = db_with_user("alice");
        let bob = db.insert_user("bob").unwrap().unwrap().id;
        for i in 0..12 {
            let owner = if i % 2 == 0 { alice } else { bob };
            db.insert_post(&format!("post {i}"), "b", "go", owner).unwrap();
        }

        let feed = db.get_feed(10).unwrap();
        assert_eq!(feed.len(), 10);
        assert_eq!(feed[0].post.title, "post 11");
        assert_eq!(feed[0].username, "bob");
        assert!(feed.windows(2).all(|w| w[0].post.created_at >= w[1].post.created_at));
    }

    #[test]
    fn comment_on_missing_post_is_not_inserted() {
        let (db, alice) = db_with_user("alice");
        assert!(db.insert_comment(99, alice, "hi", "general").unwrap().is_none());
    }

    #[test]
    fn comments_carry_username() {
        let (db, alice) = db_with_user("alice");
        let post = db.insert_post("t", "b", "go", alice).unwrap().unwrap();
        db.insert_comment(post.id, alice, "first", "general").unwrap();
        db.insert_comment(post.id, alice, "second", "rust").unwrap();

        let comments = db.get_comments(post.id, 10).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].body, "second");
        assert_eq!(comments[0].username, "alice");
        assert_eq!(comments[1].topic, "general");
    }
}
