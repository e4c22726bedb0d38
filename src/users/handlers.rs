use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::{
    auth::password::hash_password,
    error::{ApiError, FieldError},
    state::AppState,
    users::{
        dto::{CreateUserRequest, ListQuery, PublicUser, SearchQuery},
        extractors::TargetUser,
        repo_types::{Role, User},
        update::{parse_update, ADMIN_UPDATABLE},
        validate::{email_error, password_error},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_users).post(create_user).delete(delete_users),
        )
        .route("/search", get(search_by_email))
        .route(
            "/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = User::list(&state.db, &query.options()).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip_all)]
pub async fn get_user(TargetUser(user): TargetUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state))]
pub async fn search_by_email(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PublicUser>, ApiError> {
    let found = match query.email {
        Some(email) => User::find_by_email(&state.db, &email).await?,
        None => None,
    };
    match found {
        Some(user) => Ok(Json(user.into())),
        None => Err(ApiError::BadRequest("No user with that email found".into())),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let email = payload.email.as_deref().unwrap_or("").trim().to_lowercase();
    let password = payload.password.as_deref().unwrap_or("");

    let mut errors = Vec::new();
    if let Some(err) = email_error(&email) {
        errors.push(err);
    }
    if let Some(err) = password_error(password) {
        errors.push(err);
    }
    let role = match payload.role.as_deref().and_then(Role::from_wire) {
        Some(role) => role,
        None => {
            errors.push(FieldError {
                field: "role",
                message: "role must be one of ADMIN, USER".into(),
            });
            Role::User
        }
    };
    if !errors.is_empty() {
        warn!(email = %email, "user creation failed validation");
        return Err(ApiError::Validation(errors));
    }

    let hash = hash_password(password)?;
    let user = User::insert(&state.db, &email, &hash, role).await?;

    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, target, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    TargetUser(target): TargetUser,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<PublicUser>, ApiError> {
    let update = parse_update(&payload, ADMIN_UPDATABLE)?;
    let updated = target.apply_update(&state.db, update).await?;
    info!(user_id = %updated.id, "user updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, target))]
pub async fn delete_user(
    State(state): State<AppState>,
    TargetUser(target): TargetUser,
) -> Result<StatusCode, ApiError> {
    target.delete(&state.db).await?;
    info!(user_id = %target.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_users(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let deleted = User::delete_non_admin(&state.db).await?;
    info!(deleted, "deleted all non-admin users");
    Ok(StatusCode::NO_CONTENT)
}
