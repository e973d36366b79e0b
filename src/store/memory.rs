// src/store/memory.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CommentStore, PostStore, ReactionStore, StoreError, StoreResult, UserStore};
use crate::models::{
    Id,
    comment::{Comment, CommentRecord, NewComment},
    post::{FeedCursor, NewPost, Post, PostAuthor, PostCounts, PostView},
    reaction::{Reaction, ReactionKind},
    user::User,
};

#[derive(Default)]
struct State {
    users: BTreeMap<Id, User>,
    posts: BTreeMap<Id, Post>,
    comments: BTreeMap<Id, Comment>,
    reactions: BTreeMap<Id, Reaction>,
    /// Unique index over (post_id, user_id, kind).
    reaction_keys: HashSet<(Id, Id, ReactionKind)>,
    next_id: Id,
}

impl State {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn author_name(&self, id: Id) -> String {
        self.users
            .get(&id)
            .map(|u| u.display_name().to_owned())
            .unwrap_or_default()
    }

    fn record(&self, comment: &Comment) -> CommentRecord {
        CommentRecord {
            id: comment.id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            content: comment.content.clone(),
            created_at: comment.created_at,
            author_id: comment.author_id,
            author_name: self.author_name(comment.author_id),
        }
    }

    fn sorted_records<'a>(&self, comments: impl Iterator<Item = &'a Comment>) -> Vec<CommentRecord> {
        let mut found: Vec<&Comment> = comments.collect();
        found.sort_by_key(|c| (c.created_at, c.id));
        found.into_iter().map(|c| self.record(c)).collect()
    }

    fn view(&self, post: &Post, viewer: Option<Id>) -> PostView {
        let count = |kind: ReactionKind| {
            self.reactions
                .values()
                .filter(|r| r.post_id == post.id && r.kind == kind)
                .count() as i64
        };
        let reacted = |kind: ReactionKind| {
            viewer.is_some_and(|user_id| self.reaction_keys.contains(&(post.id, user_id, kind)))
        };
        let author = self.users.get(&post.author_id);

        PostView {
            id: post.id,
            caption: post.caption.clone(),
            post_type: post.post_type,
            text_content: post.text_content.clone(),
            content_url: post.content_url.clone(),
            created_at: post.created_at,
            author: PostAuthor {
                id: post.author_id,
                display_name: self.author_name(post.author_id),
                image: author.and_then(|u| u.image.clone()),
            },
            counts: PostCounts {
                comments: self.comments.values().filter(|c| c.post_id == post.id).count() as i64,
                likes: count(ReactionKind::Like),
                skulls: count(ReactionKind::Skull),
            },
            liked: reacted(ReactionKind::Like),
            skulled: reacted(ReactionKind::Skull),
        }
    }
}

/// In-process store keeping every table in ordered maps behind one lock.
///
/// Each trait method takes the lock on its own, so a check followed by a write
/// is not atomic here either; uniqueness is enforced at insert time.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provisions a user the way the identity provider would on first sign-in.
    pub async fn insert_user(&self, name: &str, image: Option<&str>) -> User {
        let mut s = self.state.write().await;
        let id = s.next_id();
        let user = User {
            id,
            name: name.to_owned(),
            username: None,
            image: image.map(str::to_owned),
            created_at: Utc::now(),
        };
        s.users.insert(id, user.clone());
        user
    }

    /// Number of stored reaction rows for a post and kind.
    pub async fn reaction_rows(&self, post_id: Id, kind: ReactionKind) -> usize {
        let s = self.state.read().await;
        s.reactions
            .values()
            .filter(|r| r.post_id == post_id && r.kind == kind)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Id) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn set_username(&self, id: Id, username: &str) -> StoreResult<User> {
        let mut s = self.state.write().await;

        if s
            .users
            .values()
            .any(|u| u.id != id && u.username.as_deref() == Some(username))
        {
            return Err(StoreError::Conflict);
        }

        let user = s.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.username = Some(username.to_owned());
        Ok(user.clone())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_posts(
        &self,
        viewer: Option<Id>,
        cursor: Option<FeedCursor>,
        limit: i64,
    ) -> StoreResult<Vec<PostView>> {
        let s = self.state.read().await;
        let mut posts: Vec<&Post> = s
            .posts
            .values()
            .filter(|p| cursor.is_none_or(|c| c.admits(p.created_at, p.id)))
            .collect();
        posts.sort_by_key(|p| std::cmp::Reverse((p.created_at, p.id)));

        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(posts
            .into_iter()
            .take(limit)
            .map(|p| s.view(p, viewer))
            .collect())
    }

    async fn find_post_view(&self, id: Id, viewer: Option<Id>) -> StoreResult<Option<PostView>> {
        let s = self.state.read().await;
        Ok(s.posts.get(&id).map(|p| s.view(p, viewer)))
    }

    async fn post_exists(&self, id: Id) -> StoreResult<bool> {
        Ok(self.state.read().await.posts.contains_key(&id))
    }

    async fn insert_post(&self, new: NewPost) -> StoreResult<Post> {
        let mut s = self.state.write().await;
        if !s.users.contains_key(&new.author_id) {
            return Err(StoreError::NotFound);
        }
        let id = s.next_id();
        let post = Post {
            id,
            author_id: new.author_id,
            caption: new.caption,
            post_type: new.post_type,
            text_content: new.text_content,
            content_url: new.content_url,
            created_at: Utc::now(),
        };
        s.posts.insert(id, post.clone());
        Ok(post)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn find_comment(&self, id: Id) -> StoreResult<Option<Comment>> {
        Ok(self.state.read().await.comments.get(&id).cloned())
    }

    async fn list_root_comments(&self, post_id: Id) -> StoreResult<Vec<CommentRecord>> {
        let s = self.state.read().await;
        Ok(s.sorted_records(
            s.comments
                .values()
                .filter(|c| c.post_id == post_id && c.parent_id.is_none()),
        ))
    }

    async fn list_replies(&self, parent_ids: &[Id]) -> StoreResult<Vec<CommentRecord>> {
        let parents: HashSet<Id> = parent_ids.iter().copied().collect();
        let s = self.state.read().await;
        Ok(s.sorted_records(
            s.comments
                .values()
                .filter(|c| c.parent_id.is_some_and(|p| parents.contains(&p))),
        ))
    }

    async fn count_replies(&self, parent_ids: &[Id]) -> StoreResult<HashMap<Id, i64>> {
        let parents: HashSet<Id> = parent_ids.iter().copied().collect();
        let s = self.state.read().await;
        let mut counts = HashMap::new();
        for parent in s.comments.values().filter_map(|c| c.parent_id) {
            if parents.contains(&parent) {
                *counts.entry(parent).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn insert_comment(&self, new: NewComment) -> StoreResult<CommentRecord> {
        let mut s = self.state.write().await;
        if !s.posts.contains_key(&new.post_id) || !s.users.contains_key(&new.author_id) {
            return Err(StoreError::NotFound);
        }
        if let Some(parent) = new.parent_id {
            if !s.comments.contains_key(&parent) {
                return Err(StoreError::NotFound);
            }
        }
        let id = s.next_id();
        let comment = Comment {
            id,
            post_id: new.post_id,
            author_id: new.author_id,
            parent_id: new.parent_id,
            content: new.content,
            created_at: Utc::now(),
        };
        let record = s.record(&comment);
        s.comments.insert(id, comment);
        Ok(record)
    }
}

#[async_trait]
impl ReactionStore for MemoryStore {
    async fn find_reaction(
        &self,
        post_id: Id,
        user_id: Id,
        kind: ReactionKind,
    ) -> StoreResult<Option<Reaction>> {
        let s = self.state.read().await;
        Ok(s
            .reactions
            .values()
            .find(|r| r.post_id == post_id && r.user_id == user_id && r.kind == kind)
            .cloned())
    }

    async fn insert_reaction(
        &self,
        post_id: Id,
        user_id: Id,
        kind: ReactionKind,
    ) -> StoreResult<Reaction> {
        let mut s = self.state.write().await;
        if !s.posts.contains_key(&post_id) || !s.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        if !s.reaction_keys.insert((post_id, user_id, kind)) {
            return Err(StoreError::Conflict);
        }
        let id = s.next_id();
        let reaction = Reaction {
            id,
            post_id,
            user_id,
            kind,
            created_at: Utc::now(),
        };
        s.reactions.insert(id, reaction.clone());
        Ok(reaction)
    }

    async fn delete_reaction(&self, id: Id) -> StoreResult<bool> {
        let mut s = self.state.write().await;
        match s.reactions.remove(&id) {
            Some(r) => {
                s.reaction_keys.remove(&(r.post_id, r.user_id, r.kind));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
