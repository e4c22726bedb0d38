use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::password::hash_password,
    error::ApiError,
    users::{
        repo_types::{Role, User},
        update::UserUpdate,
    },
};

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at, updated_at";

/// Sortable columns, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Id,
    Email,
    Role,
    CreatedAt,
    UpdatedAt,
}

impl OrderField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::Id),
            "email" => Some(Self::Email),
            "role" => Some(Self::Role),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Email => "email",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListOptions {
    pub role: Option<Role>,
    pub order: Option<(OrderField, Direction)>,
    pub skip: Option<i64>,
    pub take: Option<i64>,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn map_save_error(err: sqlx::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict("email already in use")
    } else {
        ApiError::Internal(err.into())
    }
}

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list(db: &PgPool, opts: &ListOptions) -> anyhow::Result<Vec<User>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
        if let Some(role) = opts.role {
            qb.push(" WHERE role = ").push_bind(role);
        }
        if let Some((field, dir)) = opts.order {
            qb.push(" ORDER BY ")
                .push(field.as_sql())
                .push(" ")
                .push(dir.as_sql());
        }
        if let Some(take) = opts.take {
            qb.push(" LIMIT ").push_bind(take);
        }
        if let Some(skip) = opts.skip {
            qb.push(" OFFSET ").push_bind(skip);
        }
        let users = qb.build_query_as::<User>().fetch_all(db).await?;
        Ok(users)
    }

    /// Create a new user. A duplicate email surfaces as a conflict.
    pub async fn insert(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await
        .map_err(map_save_error)
    }

    /// Persist a validated update in a single statement. The password is
    /// rehashed iff the field was part of the payload; `updated_at` is
    /// refreshed on every persisted mutation.
    pub async fn apply_update(&self, db: &PgPool, update: UserUpdate) -> Result<User, ApiError> {
        let email = update.email.as_deref().unwrap_or(&self.email);
        let password_hash = match update.password.as_deref() {
            Some(plain) => hash_password(plain)?,
            None => self.password_hash.clone(),
        };
        let role = update.role.unwrap_or(self.role);
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, role = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(self.id)
        .bind(email)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(db)
        .await
        .map_err(map_save_error)
    }

    pub async fn set_password_hash(&self, db: &PgPool, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(self.id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, db: &PgPool) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete_non_admin(db: &PgPool) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE role <> $1")
            .bind(Role::Admin)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Create the bootstrap admin account when it does not exist yet.
pub async fn ensure_admin(db: &PgPool, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    if User::find_by_email(db, &email).await?.is_some() {
        return Ok(());
    }
    let hash = hash_password(password)?;
    match User::insert(db, &email, &hash, Role::Admin).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "bootstrap admin created");
            Ok(())
        }
        // Lost a race with a concurrent boot; the row exists either way.
        Err(ApiError::Conflict(_)) => Ok(()),
        Err(err) => Err(anyhow::anyhow!(err)),
    }
}
