//! Field-update validation for partial user updates.
//!
//! A payload passes four gates in order, stopping at the first failure:
//! keys must name real user fields, keys must be in the operation's
//! allow-list, values must pass model validation, and the final save must
//! clear the storage-layer uniqueness constraint. Everything up to the save
//! runs on a working copy, so a late failure leaves the record untouched.

use serde_json::{Map, Value};

use crate::{
    error::{ApiError, FieldError},
    users::{
        repo_types::Role,
        validate::{email_error, password_error},
    },
};

/// Every field that exists on the user record, by wire name.
pub const USER_FIELDS: &[&str] = &["id", "email", "password", "role", "createdAt", "updatedAt"];

/// Fields a user may change on their own profile. Password is deliberately
/// absent: changing it requires the verified-old-password path.
pub const PROFILE_UPDATABLE: &[&str] = &["email"];

/// Fields an admin may change on any user.
pub const ADMIN_UPDATABLE: &[&str] = &["email", "password", "role"];

/// Validated partial update, ready to persist. `password` is still
/// plaintext here; it is hashed at save time iff present.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

pub fn parse_update(
    payload: &Map<String, Value>,
    allowed: &[&str],
) -> Result<UserUpdate, ApiError> {
    // Gate 1: every key names a field that exists on the entity.
    if payload.keys().any(|k| !USER_FIELDS.contains(&k.as_str())) {
        return Err(ApiError::InvalidField);
    }

    // Gate 2: every key is updatable for this operation. Stricter than and
    // independent of gate 1.
    if payload.keys().any(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::FieldNotUpdatable);
    }

    // Gate 3: type-check values and re-run the model invariants, itemizing
    // every violation.
    let mut update = UserUpdate::default();
    let mut errors = Vec::new();
    for (key, value) in payload {
        match key.as_str() {
            "email" => match value.as_str() {
                Some(raw) => {
                    let email = raw.trim().to_lowercase();
                    if let Some(err) = email_error(&email) {
                        errors.push(err);
                    }
                    update.email = Some(email);
                }
                None => errors.push(FieldError {
                    field: "email",
                    message: "email must be a string".into(),
                }),
            },
            "password" => match value.as_str() {
                Some(raw) => {
                    if let Some(err) = password_error(raw) {
                        errors.push(err);
                    }
                    update.password = Some(raw.to_string());
                }
                None => errors.push(FieldError {
                    field: "password",
                    message: "password must be a string".into(),
                }),
            },
            "role" => match value.as_str().and_then(Role::from_wire) {
                Some(role) => update.role = Some(role),
                None => errors.push(FieldError {
                    field: "role",
                    message: "role must be one of ADMIN, USER".into(),
                }),
            },
            _ => {}
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    Ok(update)
}
