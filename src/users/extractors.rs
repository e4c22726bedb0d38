use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState, users::repo_types::User};

/// The user addressed by the `:id` path parameter, loaded once and handed to
/// the handler — distinct from the acting user resolved by authentication.
/// An unparseable or unknown id short-circuits with 404.
pub struct TargetUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for TargetUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound("User not found"))?;

        match User::find_by_id(&state.db, id).await {
            Ok(Some(user)) => Ok(TargetUser(user)),
            Ok(None) => Err(ApiError::NotFound("User not found")),
            Err(err) => Err(ApiError::Internal(err)),
        }
    }
}
