// src/services/reactions.rs

use crate::{
    error::AppError,
    models::{
        Id,
        reaction::{ReactionKind, ToggleResponse},
    },
    store::{PostStore, ReactionStore, StoreError},
};

/// Flips the `kind` reaction of `user_id` on `post_id`.
///
/// An existing row is deleted (`active: false`), otherwise one is created
/// (`active: true`). Lookup and write are separate store calls, so two
/// concurrent toggles may both see no row; the store's unique constraint
/// rejects the second insert and that request also reports `active: true`.
/// Likewise a delete that finds the row already gone reports `active: false`.
pub async fn toggle<S>(
    store: &S,
    post_id: Id,
    user_id: Id,
    kind: ReactionKind,
) -> Result<ToggleResponse, AppError>
where
    S: PostStore + ReactionStore + ?Sized,
{
    if !store.post_exists(post_id).await? {
        return Err(AppError::BadRequest("Post not found".to_string()));
    }

    let active = match store.find_reaction(post_id, user_id, kind).await? {
        Some(existing) => {
            if !store.delete_reaction(existing.id).await? {
                tracing::debug!(post_id, user_id, %kind, "Reaction already removed");
            }
            false
        }
        None => match store.insert_reaction(post_id, user_id, kind).await {
            Ok(_) => true,
            Err(StoreError::Conflict) => {
                tracing::debug!(post_id, user_id, %kind, "Reaction created concurrently");
                true
            }
            Err(e) => {
                tracing::error!("Failed to toggle {} on post {}: {:?}", kind, post_id, e);
                return Err(e.into());
            }
        },
    };

    Ok(ToggleResponse { active })
}
