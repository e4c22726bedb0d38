use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::{
    repo::{Direction, ListOptions, OrderField},
    repo_types::{Role, User},
};

/// The only user shape ever returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Request body for admin user creation. Fields are optional so missing
/// ones are reported as itemized validation errors, not a body-rejection.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Query parameters for the user listing. Everything is parsed leniently:
/// unrecognized parameters and unusable values are ignored, never an error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub role: Option<String>,
    pub order_by: Option<String>,
    pub skip: Option<String>,
    pub take: Option<String>,
}

impl ListQuery {
    pub fn options(&self) -> ListOptions {
        ListOptions {
            role: self.role.as_deref().and_then(Role::parse),
            order: self.order_by.as_deref().and_then(parse_order),
            skip: parse_count(self.skip.as_deref()),
            take: parse_count(self.take.as_deref()),
        }
    }
}

fn parse_order(raw: &str) -> Option<(OrderField, Direction)> {
    let (field, dir) = raw.split_once(':')?;
    Some((OrderField::parse(field)?, Direction::parse(dir)?))
}

fn parse_count(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.parse::<i64>().ok()).filter(|n| *n > 0)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(role: &str, order_by: &str, skip: &str, take: &str) -> ListQuery {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ListQuery {
            role: opt(role),
            order_by: opt(order_by),
            skip: opt(skip),
            take: opt(take),
        }
    }

    #[test]
    fn full_query_parses() {
        let opts = query("user", "createdAt:DESC", "3", "10").options();
        assert_eq!(opts.role, Some(Role::User));
        assert_eq!(opts.order, Some((OrderField::CreatedAt, Direction::Desc)));
        assert_eq!(opts.skip, Some(3));
        assert_eq!(opts.take, Some(10));
    }

    #[test]
    fn invalid_role_filter_is_ignored() {
        let opts = query("SUPERUSER", "", "", "").options();
        assert_eq!(opts.role, None);
    }

    #[test]
    fn malformed_order_by_is_ignored() {
        assert_eq!(query("", "createdAt", "", "").options().order, None);
        assert_eq!(query("", "password:ASC", "", "").options().order, None);
        assert_eq!(query("", "email:sideways", "", "").options().order, None);
    }

    #[test]
    fn non_numeric_counts_are_ignored() {
        let opts = query("", "", "three", "-2").options();
        assert_eq!(opts.skip, None);
        assert_eq!(opts.take, None);
    }

    #[test]
    fn empty_query_is_unfiltered() {
        assert_eq!(ListQuery::default().options(), ListOptions::default());
    }

    #[test]
    fn public_user_omits_password_hash() {
        let json = serde_json::to_value(PublicUser {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            role: Role::User,
        })
        .expect("serialize");
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["email", "id", "role"]);
    }
}
