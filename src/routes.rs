// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{community, interaction, profile},
    state::AppState,
    utils::jwt::identify_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (posts, comments/reactions, users).
/// * Resolves the optional bearer identity for every request.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let post_routes = Router::new()
        .route("/", get(community::list_posts).post(community::create_post))
        .route("/{id}", get(community::get_post))
        .route(
            "/{id}/comments",
            get(interaction::list_comments).post(interaction::create_comment),
        )
        .route("/{id}/reactions/{kind}", post(interaction::toggle_reaction))
        .route("/{id}/like", post(interaction::toggle_like))
        .route("/{id}/skull", post(interaction::toggle_skull));

    let user_routes = Router::new()
        .route("/me", get(profile::get_me))
        .route("/me/username", post(profile::set_username));

    Router::new()
        .nest("/api/posts", post_routes)
        .nest("/api/users", user_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identify_middleware,
        ))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
