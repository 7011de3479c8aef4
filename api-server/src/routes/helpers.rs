//! Shared helper functions for Rocket route handlers.

use rocket_db_pools::sqlx::{self, PgConnection, PgExecutor};

use crate::error::ApiError;

/// Trim `value` and reject it when nothing is left.
pub fn required_text(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::BadRequest(format!("{field} must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trim an optional value, treating blank input as absent.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Fail with [`ApiError::NotFound`] unless the shoutout exists.
pub async fn ensure_shoutout<'e, E: PgExecutor<'e>>(
    executor: E,
    shoutout_id: i32,
) -> Result<(), ApiError> {
    let found: Option<i32> = sqlx::query_scalar("SELECT id FROM shoutouts WHERE id = $1")
        .bind(shoutout_id)
        .fetch_optional(executor)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound(format!("Shoutout {shoutout_id} not found")))
}

/// Fail with [`ApiError::NotFound`] unless the comment exists.
pub async fn ensure_comment<'e, E: PgExecutor<'e>>(
    executor: E,
    comment_id: i32,
) -> Result<(), ApiError> {
    let found: Option<i32> = sqlx::query_scalar("SELECT id FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(executor)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound(format!("Comment {comment_id} not found")))
}

/// Append an entry to the moderation audit trail.
pub async fn record_admin_action(
    conn: &mut PgConnection,
    admin_id: i32,
    action: &str,
    target_id: i32,
    target_type: &str,
) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO admin_logs (admin_id, action, target_id, target_type) VALUES ($1, $2, $3, $4)",
    )
    .bind(admin_id)
    .bind(action)
    .bind(target_id)
    .bind(target_type)
    .execute(conn)
    .await?;
    log::info!("admin {admin_id}: {action} {target_type} {target_id}");
    Ok(())
}
