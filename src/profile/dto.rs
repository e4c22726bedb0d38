use serde::Deserialize;

/// Request body for the verified-old-password change. Fields are optional so
/// a missing one is reported as a 400 rather than a body-rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}
