use axum::{
    extract::{FromRef, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::{
    auth::jwt::JwtKeys,
    error::ApiError,
    state::AppState,
    users::repo_types::{Role, User},
};

/// Response header carrying the reissued token on every authenticated call.
pub const TOKEN_HEADER: &str = "token";

/// The acting user, resolved from the bearer token and attached to the
/// request extensions for downstream steps.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Authentication step: verify the bearer token, load the acting user, and
/// reissue a fresh token on the response. Missing header, bad scheme, failed
/// verification and a deleted subject are indistinguishable to the caller.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        return ApiError::Unauthenticated.into_response();
    };

    let keys = JwtKeys::from_ref(&state);
    let claims = match keys.verify(&token) {
        Ok(claims) => claims,
        Err(_) => {
            warn!("invalid or expired token");
            return ApiError::Unauthenticated.into_response();
        }
    };

    let user = match User::find_by_id(&state.db, claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            return ApiError::Unauthenticated.into_response();
        }
        Err(e) => {
            error!(error = %e, "load current user failed");
            return ApiError::Internal(e).into_response();
        }
    };

    // Every authenticated call extends the session.
    let fresh = match keys.sign(user.id, &user.email) {
        Ok(token) => token,
        Err(e) => return ApiError::Internal(e).into_response(),
    };

    req.extensions_mut().insert(CurrentUser(user));
    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&fresh) {
        res.headers_mut().insert(TOKEN_HEADER, value);
    }
    res
}

fn role_permitted(user: Option<&CurrentUser>, roles: &[Role]) -> bool {
    // Default deny when authentication never attached a user.
    user.map(|CurrentUser(u)| roles.contains(&u.role))
        .unwrap_or(false)
}

async fn check_role(roles: &[Role], req: Request, next: Next) -> Response {
    if role_permitted(req.extensions().get::<CurrentUser>(), roles) {
        next.run(req).await
    } else {
        ApiError::Forbidden.into_response()
    }
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    check_role(&[Role::Admin], req, next).await
}

pub async fn require_member(req: Request, next: Next) -> Response {
    check_role(&[Role::Admin, Role::User], req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn fake_user(role: Role) -> CurrentUser {
        CurrentUser(User {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            password_hash: "hash".into(),
            role,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        })
    }

    #[test]
    fn bearer_token_extracts_value() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn bearer_token_requires_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn admin_routes_permit_admin_only() {
        assert!(role_permitted(
            Some(&fake_user(Role::Admin)),
            &[Role::Admin]
        ));
        assert!(!role_permitted(Some(&fake_user(Role::User)), &[Role::Admin]));
    }

    #[test]
    fn member_routes_permit_both_roles() {
        let roles = [Role::Admin, Role::User];
        assert!(role_permitted(Some(&fake_user(Role::Admin)), &roles));
        assert!(role_permitted(Some(&fake_user(Role::User)), &roles));
    }

    #[test]
    fn missing_identity_is_denied() {
        assert!(!role_permitted(None, &[Role::Admin, Role::User]));
    }
}
