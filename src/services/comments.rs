// src/services/comments.rs

//! Threaded comment retrieval and creation.

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{
        Id,
        comment::{CommentNode, CommentRecord, NewComment},
    },
    store::{CommentStore, PostStore},
};

/// Nesting depth expanded by a default thread fetch.
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Longest comment accepted, counted in characters after trimming.
pub const MAX_COMMENT_CHARS: usize = 1000;

struct Slot {
    node: CommentNode,
    parent: Option<usize>,
}

/// Flat storage for a thread under construction.
/// A reply is always pushed after its parent, so children have higher indices.
#[derive(Default)]
struct ThreadArena {
    slots: Vec<Slot>,
}

impl ThreadArena {
    fn push(&mut self, record: CommentRecord, parent: Option<usize>) -> usize {
        self.slots.push(Slot {
            node: CommentNode::leaf(record, 0),
            parent,
        });
        self.slots.len() - 1
    }

    fn ids(&self, indices: &[usize]) -> Vec<Id> {
        indices.iter().map(|&i| self.slots[i].node.id).collect()
    }

    /// Folds the arena into nested nodes, walking from the last slot back to the first.
    fn into_tree(self) -> Vec<CommentNode> {
        let mut parents = Vec::with_capacity(self.slots.len());
        let mut nodes: Vec<Option<CommentNode>> = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            parents.push(slot.parent);
            nodes.push(Some(slot.node));
        }

        let mut roots = Vec::new();
        for idx in (0..nodes.len()).rev() {
            let Some(mut node) = nodes[idx].take() else {
                continue;
            };
            // Children were attached last-to-first.
            node.replies.reverse();
            match parents[idx] {
                Some(parent) => {
                    if let Some(parent_node) = nodes[parent].as_mut() {
                        parent_node.replies.push(node);
                    }
                }
                None => roots.push(node),
            }
        }
        roots.reverse();
        roots
    }
}

/// Builds the comment thread of a post.
///
/// Root comments come first, then replies are fetched one level at a time for
/// the whole frontier, so a fetch costs `max_depth + 2` store calls at most.
/// Comments on the deepest expanded level carry their `reply_count` but no
/// `replies`. Every level is ordered by creation time, oldest first.
///
/// An unknown post yields an empty thread.
pub async fn get_thread<S>(store: &S, post_id: Id, max_depth: usize) -> Result<Vec<CommentNode>, AppError>
where
    S: CommentStore + ?Sized,
{
    let mut roots = store.list_root_comments(post_id).await?;
    if roots.is_empty() {
        return Ok(Vec::new());
    }

    sort_by_creation(&mut roots);
    let mut arena = ThreadArena::default();
    let mut frontier: Vec<usize> = roots.into_iter().map(|r| arena.push(r, None)).collect();

    let mut depth = 0;
    while depth < max_depth && !frontier.is_empty() {
        let index: HashMap<Id, usize> = frontier
            .iter()
            .map(|&i| (arena.slots[i].node.id, i))
            .collect();
        let mut replies = store.list_replies(&arena.ids(&frontier)).await?;
        sort_by_creation(&mut replies);

        let mut next = Vec::with_capacity(replies.len());
        for reply in replies {
            let Some(&parent) = reply.parent_id.and_then(|p| index.get(&p)) else {
                continue;
            };
            arena.slots[parent].node.reply_count += 1;
            next.push(arena.push(reply, Some(parent)));
        }

        frontier = next;
        depth += 1;
    }

    // The boundary level is not expanded; report how many replies sit below it.
    if !frontier.is_empty() {
        let counts = store.count_replies(&arena.ids(&frontier)).await?;
        for &i in &frontier {
            let node = &mut arena.slots[i].node;
            node.reply_count = counts.get(&node.id).copied().unwrap_or(0);
        }
    }

    tracing::debug!(post_id, max_depth, nodes = arena.slots.len(), "Assembled comment thread");

    Ok(arena.into_tree())
}

/// Oldest first; equal timestamps fall back to id order.
fn sort_by_creation(records: &mut [CommentRecord]) {
    records.sort_by_key(|r| (r.created_at, r.id));
}

/// Adds a root comment or a reply to a post.
///
/// The author is assumed to be authenticated already. Content is stored trimmed.
/// A reply's parent must belong to the same post.
pub async fn add_comment<S>(
    store: &S,
    post_id: Id,
    author_id: Id,
    content: &str,
    parent_id: Option<Id>,
) -> Result<CommentNode, AppError>
where
    S: PostStore + CommentStore + ?Sized,
{
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }

    if !store.post_exists(post_id).await? {
        return Err(AppError::BadRequest("Post not found".to_string()));
    }

    if let Some(pid) = parent_id {
        match store.find_comment(pid).await? {
            Some(parent) if parent.post_id == post_id => {}
            _ => {
                tracing::debug!(post_id, parent_id = pid, "Rejected reply with invalid parent");
                return Err(AppError::BadRequest("Invalid parent comment".to_string()));
            }
        }
    }

    let record = store
        .insert_comment(NewComment {
            post_id,
            author_id,
            parent_id,
            content: content.to_owned(),
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {:?}", e);
            AppError::from(e)
        })?;

    tracing::info!(post_id, comment_id = record.id, ?parent_id, "Comment created");

    Ok(CommentNode::leaf(record, 0))
}
