// src/handlers/mod.rs

pub mod community;
pub mod interaction;
pub mod profile;

use crate::{error::AppError, models::user::User, store::UserStore, utils::jwt::Claims};

/// Loads the user behind a verified token.
/// A token for a user the store does not know is treated as unauthenticated.
pub(crate) async fn current_user<S>(store: &S, claims: &Claims) -> Result<User, AppError>
where
    S: UserStore + ?Sized,
{
    let user_id = claims.user_id()?;
    store
        .find_user(user_id)
        .await?
        .ok_or(AppError::AuthError("User not found".to_string()))
}
