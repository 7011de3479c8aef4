//! User directory listing for signed-in employees.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::openapi;

use crate::auth::AuthUser;
use crate::auth::directory::user_from_row;
use crate::error::ApiError;
use crate::models::UserProfile;

pub(crate) async fn load_profiles(pool: &PgPool) -> Result<Vec<UserProfile>, ApiError> {
    let rows = sqlx::query(
        "SELECT id, name, email, password_hash, department, designation, profile_pic, role, joined_at \
         FROM users ORDER BY name ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| user_from_row(row).map(|user| UserProfile::from(&user)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::from)
}

/// Every user, for recipient pickers and name lookups.
#[openapi(tag = "Users")]
#[get("/users")]
pub async fn list_users(
    _user: AuthUser,
    pool: &State<PgPool>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    Ok(Json(load_profiles(pool.inner()).await?))
}
