use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Image,
}

impl PostType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Text => "text",
            PostType::Image => "image",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(PostType::Text),
            "image" => Ok(PostType::Image),
            other => Err(format!("Unknown post type '{}'", other)),
        }
    }
}

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Id,
    pub author_id: Id,
    pub caption: Option<String>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub text_content: Option<String>,

    /// Public URL handed out by the object storage bucket (image posts).
    pub content_url: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload passed to the store once the request is validated.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Id,
    pub caption: Option<String>,
    pub post_type: PostType,
    pub text_content: Option<String>,
    pub content_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: Id,
    pub display_name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostCounts {
    pub comments: i64,
    pub likes: i64,
    pub skulls: i64,
}

/// A post as shown in the feed.
/// `liked` / `skulled` describe the requesting user and are false for anonymous reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Id,
    pub caption: Option<String>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub text_content: Option<String>,
    pub content_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author: PostAuthor,
    pub counts: PostCounts,
    pub liked: bool,
    pub skulled: bool,
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(max = 300, message = "Caption must be at most 300 characters"))]
    pub caption: Option<String>,

    #[serde(rename = "type")]
    pub post_type: PostType,

    #[validate(length(max = 5000, message = "Text must be at most 5000 characters"))]
    pub text_content: Option<String>,

    #[validate(length(max = 2048, message = "URL must be at most 2048 characters"))]
    pub content_url: Option<String>,
}

/// Query parameters for listing posts.
#[derive(Debug, Deserialize)]
pub struct PostListParams {
    /// Cursor for pagination: the created_at timestamp of the last post in the previous page.
    pub cursor: Option<chrono::DateTime<chrono::Utc>>,

    /// Id of that last post. Without it, posts sharing the cursor timestamp are skipped.
    #[serde(rename = "cursorId")]
    pub cursor_id: Option<Id>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

impl PostListParams {
    pub fn feed_cursor(&self) -> Option<FeedCursor> {
        self.cursor.map(|created_at| FeedCursor {
            created_at,
            id: self.cursor_id,
        })
    }
}

/// Keyset position in the feed, which is ordered by `(created_at, id)` descending.
/// A page starting here holds only posts strictly after it in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCursor {
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub id: Option<Id>,
}

impl FeedCursor {
    /// Whether a post at `(created_at, id)` sorts after this cursor.
    pub fn admits(&self, created_at: chrono::DateTime<chrono::Utc>, id: Id) -> bool {
        match self.id {
            Some(cursor_id) => (created_at, id) < (self.created_at, cursor_id),
            None => created_at < self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[test]
    fn cursor_with_id_breaks_timestamp_ties() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let cursor = FeedCursor { created_at: at, id: Some(10) };

        assert!(cursor.admits(at, 9));
        assert!(!cursor.admits(at, 10));
        assert!(!cursor.admits(at, 11));
        assert!(cursor.admits(at - Duration::seconds(1), 99));
        assert!(!cursor.admits(at + Duration::seconds(1), 1));
    }

    #[test]
    fn cursor_without_id_is_strictly_older() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let cursor = FeedCursor { created_at: at, id: None };

        assert!(!cursor.admits(at, 1));
        assert!(cursor.admits(at - Duration::milliseconds(1), 1));
    }
}
