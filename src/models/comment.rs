use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Id, user::AuthorSummary};

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub post_id: Id,
    pub author_id: Id,
    /// `None` for root comments.
    pub parent_id: Option<Id>,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A comment row joined with its author's display name.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRecord {
    pub id: Id,
    pub post_id: Id,
    pub parent_id: Option<Id>,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author_id: Id,
    pub author_name: String,
}

/// Insert payload for the store. `content` is already trimmed.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Id,
    pub author_id: Id,
    pub parent_id: Option<Id>,
    pub content: String,
}

/// DTO for creating a new comment. Content rules are applied after trimming.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,

    /// Optional: the ID of the comment being replied to.
    pub parent_id: Option<Id>,
}

/// Query parameters for fetching a thread.
#[derive(Debug, Deserialize)]
pub struct ThreadParams {
    /// Requested nesting depth. Clamped to the configured maximum.
    pub depth: Option<usize>,
}

/// One node of a comment thread.
///
/// `reply_count` is the number of direct replies stored for this comment,
/// whether or not they are expanded into `replies`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: Id,
    pub post_id: Id,
    pub parent_id: Option<Id>,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author: AuthorSummary,
    pub reply_count: i64,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Builds a node with no expanded replies.
    pub fn leaf(record: CommentRecord, reply_count: i64) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            parent_id: record.parent_id,
            content: record.content,
            created_at: record.created_at,
            author: AuthorSummary {
                id: record.author_id,
                display_name: record.author_name,
            },
            reply_count,
            replies: Vec::new(),
        }
    }
}
