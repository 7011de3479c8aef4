//! User identity lookups consumed by the authentication core.

use rocket_db_pools::sqlx::{self, PgPool, Row, postgres::PgRow};

use crate::auth::responses::Role;
use crate::auth::{AuthError, AuthResult};
use crate::models::{NewUser, User};

/// Lookup and creation of user identities.
#[rocket::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AuthResult<Option<User>>;

    /// Exact, case-sensitive match on the stored email.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Persist a new user. Fails with [`AuthError::Conflict`] when the email
    /// is already taken.
    async fn create(&self, new_user: NewUser) -> AuthResult<User>;
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, department, designation, profile_pic, role, joined_at";

#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: i32) -> AuthResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose().map_err(AuthError::from)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose().map_err(AuthError::from)
    }

    async fn create(&self, new_user: NewUser) -> AuthResult<User> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO users (name, email, password_hash, department, designation, profile_pic, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.department)
        .bind(&new_user.designation)
        .bind(&new_user.profile_pic)
        .bind(new_user.role.as_str())
        .fetch_one(&mut *tx)
        .await;

        // Dropping `tx` on the error paths rolls the insert back.
        let row = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(AuthError::Conflict);
            }
            Err(err) => return Err(err.into()),
        };
        let user = user_from_row(&row)?;

        tx.commit().await?;
        Ok(user)
    }
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let role: Option<String> = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        department: row.try_get("department")?,
        designation: row.try_get("designation")?,
        profile_pic: row.try_get("profile_pic")?,
        role: role.as_deref().and_then(Role::parse),
        joined_at: row.try_get("joined_at")?,
    })
}
