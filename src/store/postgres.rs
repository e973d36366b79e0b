// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{CommentStore, PostStore, ReactionStore, StoreError, StoreResult, UserStore};
use crate::models::{
    Id,
    comment::{Comment, CommentRecord, NewComment},
    post::{FeedCursor, NewPost, Post, PostAuthor, PostCounts, PostView},
    reaction::{Reaction, ReactionKind},
    user::User,
};

/// Counts and viewer flags are computed per row; indexes on
/// `comments(post_id)` and `reactions(post_id, user_id, kind)` keep them cheap.
const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id, p.caption, p.post_type, p.text_content, p.content_url, p.created_at,
        u.id AS author_id,
        COALESCE(u.username, u.name) AS author_name,
        u.image AS author_image,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
        (SELECT COUNT(*) FROM reactions r WHERE r.post_id = p.id AND r.kind = 'like') AS likes_count,
        (SELECT COUNT(*) FROM reactions r WHERE r.post_id = p.id AND r.kind = 'skull') AS skulls_count,
        EXISTS (
            SELECT 1 FROM reactions r
            WHERE r.post_id = p.id AND r.kind = 'like' AND r.user_id = $1
        ) AS liked,
        EXISTS (
            SELECT 1 FROM reactions r
            WHERE r.post_id = p.id AND r.kind = 'skull' AND r.user_id = $1
        ) AS skulled
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const COMMENT_RECORD_SELECT: &str = r#"
    SELECT
        c.id, c.post_id, c.parent_id, c.content, c.created_at,
        c.author_id, COALESCE(u.username, u.name) AS author_name
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

#[derive(FromRow)]
struct PostRow {
    id: Id,
    author_id: Id,
    caption: Option<String>,
    post_type: String,
    text_content: Option<String>,
    content_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = StoreError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.id,
            author_id: row.author_id,
            caption: row.caption,
            post_type: row.post_type.parse().map_err(StoreError::Database)?,
            text_content: row.text_content,
            content_url: row.content_url,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct PostViewRow {
    id: Id,
    caption: Option<String>,
    post_type: String,
    text_content: Option<String>,
    content_url: Option<String>,
    created_at: DateTime<Utc>,
    author_id: Id,
    author_name: String,
    author_image: Option<String>,
    comments_count: i64,
    likes_count: i64,
    skulls_count: i64,
    liked: bool,
    skulled: bool,
}

impl TryFrom<PostViewRow> for PostView {
    type Error = StoreError;

    fn try_from(row: PostViewRow) -> Result<Self, Self::Error> {
        Ok(PostView {
            id: row.id,
            caption: row.caption,
            post_type: row.post_type.parse().map_err(StoreError::Database)?,
            text_content: row.text_content,
            content_url: row.content_url,
            created_at: row.created_at,
            author: PostAuthor {
                id: row.author_id,
                display_name: row.author_name,
                image: row.author_image,
            },
            counts: PostCounts {
                comments: row.comments_count,
                likes: row.likes_count,
                skulls: row.skulls_count,
            },
            liked: row.liked,
            skulled: row.skulled,
        })
    }
}

#[derive(FromRow)]
struct ReactionRow {
    id: Id,
    post_id: Id,
    user_id: Id,
    kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReactionRow> for Reaction {
    type Error = StoreError;

    fn try_from(row: ReactionRow) -> Result<Self, Self::Error> {
        Ok(Reaction {
            id: row.id,
            post_id: row.post_id,
            user_id: row.user_id,
            kind: row.kind.parse().map_err(StoreError::Database)?,
            created_at: row.created_at,
        })
    }
}

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: Id) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, username, image, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_username(&self, id: Id, username: &str) -> StoreResult<User> {
        // users.username carries a UNIQUE constraint; a taken name surfaces as Conflict.
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET username = $2
            WHERE id = $1
            RETURNING id, name, username, image, created_at
            "#,
        )
        .bind(id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn list_posts(
        &self,
        viewer: Option<Id>,
        cursor: Option<FeedCursor>,
        limit: i64,
    ) -> StoreResult<Vec<PostView>> {
        let sql = format!(
            "{POST_VIEW_SELECT}
            WHERE ($2::TIMESTAMPTZ IS NULL
                OR p.created_at < $2
                OR (p.created_at = $2 AND p.id < $4::BIGINT))
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3"
        );
        let rows = sqlx::query_as::<_, PostViewRow>(&sql)
            .bind(viewer)
            .bind(cursor.map(|c| c.created_at))
            .bind(limit)
            .bind(cursor.and_then(|c| c.id))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PostView::try_from).collect()
    }

    async fn find_post_view(&self, id: Id, viewer: Option<Id>) -> StoreResult<Option<PostView>> {
        let sql = format!("{POST_VIEW_SELECT} WHERE p.id = $2");
        sqlx::query_as::<_, PostViewRow>(&sql)
            .bind(viewer)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PostView::try_from)
            .transpose()
    }

    async fn post_exists(&self, id: Id) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_post(&self, new: NewPost) -> StoreResult<Post> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (author_id, caption, post_type, text_content, content_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, author_id, caption, post_type, text_content, content_url, created_at
            "#,
        )
        .bind(new.author_id)
        .bind(new.caption)
        .bind(new.post_type.as_str())
        .bind(new.text_content)
        .bind(new.content_url)
        .fetch_one(&self.pool)
        .await?;
        Post::try_from(row)
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn find_comment(&self, id: Id) -> StoreResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, parent_id, content, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_root_comments(&self, post_id: Id) -> StoreResult<Vec<CommentRecord>> {
        let sql = format!(
            "{COMMENT_RECORD_SELECT}
            WHERE c.post_id = $1 AND c.parent_id IS NULL
            ORDER BY c.created_at ASC, c.id ASC"
        );
        let records = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn list_replies(&self, parent_ids: &[Id]) -> StoreResult<Vec<CommentRecord>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{COMMENT_RECORD_SELECT}
            WHERE c.parent_id = ANY($1)
            ORDER BY c.created_at ASC, c.id ASC"
        );
        let records = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(parent_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn count_replies(&self, parent_ids: &[Id]) -> StoreResult<HashMap<Id, i64>> {
        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (Id, i64)>(
            r#"
            SELECT parent_id, COUNT(*)
            FROM comments
            WHERE parent_id = ANY($1)
            GROUP BY parent_id
            "#,
        )
        .bind(parent_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn insert_comment(&self, new: NewComment) -> StoreResult<CommentRecord> {
        let record = sqlx::query_as::<_, CommentRecord>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, parent_id, content)
                VALUES ($1, $2, $3, $4)
                RETURNING id, post_id, author_id, parent_id, content, created_at
            )
            SELECT
                i.id, i.post_id, i.parent_id, i.content, i.created_at,
                i.author_id, COALESCE(u.username, u.name) AS author_name
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(new.post_id)
        .bind(new.author_id)
        .bind(new.parent_id)
        .bind(new.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }
}

#[async_trait]
impl ReactionStore for PgStore {
    async fn find_reaction(
        &self,
        post_id: Id,
        user_id: Id,
        kind: ReactionKind,
    ) -> StoreResult<Option<Reaction>> {
        sqlx::query_as::<_, ReactionRow>(
            r#"
            SELECT id, post_id, user_id, kind, created_at
            FROM reactions
            WHERE post_id = $1 AND user_id = $2 AND kind = $3
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(Reaction::try_from)
        .transpose()
    }

    async fn insert_reaction(
        &self,
        post_id: Id,
        user_id: Id,
        kind: ReactionKind,
    ) -> StoreResult<Reaction> {
        // UNIQUE (post_id, user_id, kind) turns a lost race into StoreError::Conflict.
        let row = sqlx::query_as::<_, ReactionRow>(
            r#"
            INSERT INTO reactions (post_id, user_id, kind)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, user_id, kind, created_at
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;
        Reaction::try_from(row)
    }

    async fn delete_reaction(&self, id: Id) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reactions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
