use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::current_user,
    models::{
        Id,
        comment::{CreateCommentRequest, ThreadParams},
        reaction::ReactionKind,
    },
    services::{comments, reactions},
    state::{AppState, SharedStore},
    utils::jwt::Claims,
};

/// List the comment thread of a post.
/// Unknown posts yield an empty list.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Id>,
    Query(params): Query<ThreadParams>,
) -> Result<impl IntoResponse, AppError> {
    let max_depth = params
        .depth
        .map_or(state.config.thread_max_depth, |d| d.min(state.config.thread_max_depth));

    let thread = comments::get_thread(state.store.as_ref(), post_id, max_depth).await?;

    Ok(Json(thread))
}

/// Create a new comment or reply.
pub async fn create_comment(
    State(store): State<SharedStore>,
    claims: Claims,
    Path(post_id): Path<Id>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(store.as_ref(), &claims).await?;

    let node = comments::add_comment(
        store.as_ref(),
        post_id,
        user.id,
        &payload.content,
        payload.parent_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(node)))
}

/// Toggle a reaction of the given kind on a post.
pub async fn toggle_reaction(
    State(store): State<SharedStore>,
    claims: Claims,
    Path((post_id, kind)): Path<(Id, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = kind.parse::<ReactionKind>().map_err(AppError::BadRequest)?;
    toggle(store, claims, post_id, kind).await
}

/// Toggle Like on a post.
pub async fn toggle_like(
    State(store): State<SharedStore>,
    claims: Claims,
    Path(post_id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    toggle(store, claims, post_id, ReactionKind::Like).await
}

/// Toggle Skull on a post.
pub async fn toggle_skull(
    State(store): State<SharedStore>,
    claims: Claims,
    Path(post_id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    toggle(store, claims, post_id, ReactionKind::Skull).await
}

async fn toggle(
    store: SharedStore,
    claims: Claims,
    post_id: Id,
    kind: ReactionKind,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(store.as_ref(), &claims).await?;
    let state = reactions::toggle(store.as_ref(), post_id, user.id, kind).await?;
    Ok(Json(state))
}
