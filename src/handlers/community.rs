use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use url::Url;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::current_user,
    models::{
        Id,
        post::{CreatePostRequest, NewPost, PostListParams, PostType},
    },
    state::SharedStore,
    utils::jwt::{Claims, Viewer},
};

/// Create a new post.
/// Text posts need text content; image posts need the public URL of an
/// image already uploaded to the storage bucket.
pub async fn create_post(
    State(store): State<SharedStore>,
    claims: Claims,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Validate payload
    payload.validate()?;

    let text_content = non_blank(payload.text_content);
    let content_url = non_blank(payload.content_url);

    match payload.post_type {
        PostType::Text if text_content.is_none() => {
            return Err(AppError::BadRequest(
                "Text content is required for text posts".to_string(),
            ));
        }
        PostType::Image => {
            let url = content_url.as_deref().ok_or_else(|| {
                AppError::BadRequest("Image URL is required for image posts".to_string())
            })?;
            validate_content_url(url)?;
        }
        PostType::Text => {}
    }

    // 2. Resolve the author
    let user = current_user(store.as_ref(), &claims).await?;

    // 3. Insert Post
    let post = store
        .insert_post(NewPost {
            author_id: user.id,
            caption: non_blank(payload.caption),
            post_type: payload.post_type,
            text_content,
            content_url,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {:?}", e);
            AppError::from(e)
        })?;

    tracing::info!(post_id = post.id, author_id = user.id, "Post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// List posts (Recent first).
/// Supports cursor-based pagination; reaction flags reflect the viewer, if any.
pub async fn list_posts(
    State(store): State<SharedStore>,
    viewer: Viewer,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100); // Default 20, max 100

    let posts = store
        .list_posts(viewer.user_id(), params.feed_cursor(), limit)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list posts: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(posts))
}

/// Get a single post by ID.
pub async fn get_post(
    State(store): State<SharedStore>,
    viewer: Viewer,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    let post = store
        .find_post_view(id, viewer.user_id())
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Image URLs must be absolute http(s) URLs.
fn validate_content_url(raw: &str) -> Result<(), AppError> {
    match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err(AppError::BadRequest("Invalid image URL".to_string())),
    }
}
