use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// A single model-validation failure, itemized per field in the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every failure a handler can surface. Each variant maps to exactly one
/// status code and a stable machine-readable code; the body is always
/// `{"error": <message>, "code": <CODE>}`, plus `"fields"` for validation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication Failed")]
    Unauthenticated,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("User does not have permission to access this endpoint")]
    Forbidden,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Invalid updates")]
    InvalidField,
    #[error("Field cannot be updated")]
    FieldNotUpdatable,
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidField
            | ApiError::FieldNotUpdatable
            | ApiError::BadRequest(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidField => "INVALID_FIELD",
            ApiError::FieldNotUpdatable => "FIELD_NOT_UPDATABLE",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal detail stays in the logs, never in the body.
        let message = match &self {
            ApiError::Internal(err) => {
                error!(error = %err, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let mut body = json!({ "error": message, "code": self.code() });
        if let ApiError::Validation(fields) = &self {
            body["fields"] = serde_json::to_value(fields).unwrap_or_default();
        }
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Unauthorized("Wrong old password").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::NotFound("User not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::InvalidField.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::FieldNotUpdatable.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Conflict("email already in use").status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn body_carries_message_and_code() {
        let res = ApiError::FieldNotUpdatable.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["error"], "Field cannot be updated");
        assert_eq!(body["code"], "FIELD_NOT_UPDATABLE");
    }

    #[tokio::test]
    async fn validation_body_itemizes_fields() {
        let err = ApiError::Validation(vec![FieldError {
            field: "email",
            message: "email must be a well-formed address".into(),
        }]);
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["fields"][0]["field"], "email");
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused on 10.0.0.3"));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["error"], "Internal server error");
    }
}
