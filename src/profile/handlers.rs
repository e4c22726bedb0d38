use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch},
    Extension, Json, Router,
};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        middleware::CurrentUser,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    profile::dto::ChangePasswordRequest,
    state::AppState,
    users::{
        dto::PublicUser,
        update::{parse_update, PROFILE_UPDATABLE},
        validate::password_error,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile))
        .route("/update", patch(update_profile))
        .route("/change-password", patch(change_password))
        .route("/delete", delete(delete_profile))
}

#[instrument(skip_all)]
pub async fn get_profile(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state, user, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<PublicUser>, ApiError> {
    let update = parse_update(&payload, PROFILE_UPDATABLE)?;
    let updated = user.apply_update(&state.db, update).await?;
    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated.into()))
}

/// Password changes bypass the generic allow-list on purpose: they require
/// proof of the current password.
#[instrument(skip(state, user, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let (Some(old), Some(new)) = (payload.old_password, payload.new_password) else {
        return Err(ApiError::BadRequest(
            "Request body lacked fields: oldPassword and/or newPassword".into(),
        ));
    };

    if !verify_password(&old, &user.password_hash)? {
        warn!(user_id = %user.id, "change password with wrong old password");
        return Err(ApiError::Unauthorized("Wrong old password"));
    }

    if let Some(err) = password_error(&new) {
        return Err(ApiError::Validation(vec![err]));
    }

    let hash = hash_password(&new)?;
    user.set_password_hash(&state.db, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    user.delete(&state.db).await?;
    info!(user_id = %user.id, "profile deleted");
    Ok(StatusCode::NO_CONTENT)
}
