// src/store/mod.rs

//! Persistence seams.
//!
//! Each concern gets its own trait so services can ask for exactly what they
//! touch. `PgStore` backs production; `MemoryStore` backs tests and local runs
//! without a database.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::{
    Id,
    comment::{Comment, CommentRecord, NewComment},
    post::{FeedCursor, NewPost, Post, PostView},
    reaction::{Reaction, ReactionKind},
    user::User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    /// A uniqueness constraint rejected the write.
    #[error("conflict")]
    Conflict,
    #[error("database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound,
            _ => StoreError::Database(err.to_string()),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Id) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when another user already holds `username`.
    async fn set_username(&self, id: Id, username: &str) -> StoreResult<User>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Newest first by `(created_at, id)`, optionally only posts past `cursor`.
    async fn list_posts(
        &self,
        viewer: Option<Id>,
        cursor: Option<FeedCursor>,
        limit: i64,
    ) -> StoreResult<Vec<PostView>>;
    async fn find_post_view(&self, id: Id, viewer: Option<Id>) -> StoreResult<Option<PostView>>;
    async fn post_exists(&self, id: Id) -> StoreResult<bool>;
    async fn insert_post(&self, new: NewPost) -> StoreResult<Post>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn find_comment(&self, id: Id) -> StoreResult<Option<Comment>>;
    /// Root comments of a post, oldest first.
    async fn list_root_comments(&self, post_id: Id) -> StoreResult<Vec<CommentRecord>>;
    /// Direct replies of every comment in `parent_ids` in one round trip, oldest first.
    async fn list_replies(&self, parent_ids: &[Id]) -> StoreResult<Vec<CommentRecord>>;
    /// Direct reply counts keyed by parent id. Parents without replies are absent.
    async fn count_replies(&self, parent_ids: &[Id]) -> StoreResult<HashMap<Id, i64>>;
    async fn insert_comment(&self, new: NewComment) -> StoreResult<CommentRecord>;
}

#[async_trait]
pub trait ReactionStore: Send + Sync {
    async fn find_reaction(
        &self,
        post_id: Id,
        user_id: Id,
        kind: ReactionKind,
    ) -> StoreResult<Option<Reaction>>;
    /// Fails with `Conflict` when the (post, user, kind) row already exists.
    async fn insert_reaction(
        &self,
        post_id: Id,
        user_id: Id,
        kind: ReactionKind,
    ) -> StoreResult<Reaction>;
    /// Returns `false` when the row was already gone.
    async fn delete_reaction(&self, id: Id) -> StoreResult<bool>;
}

pub trait Store: UserStore + PostStore + CommentStore + ReactionStore {}

impl<T> Store for T where T: UserStore + PostStore + CommentStore + ReactionStore {}
