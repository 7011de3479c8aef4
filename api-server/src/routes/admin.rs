//! Moderation endpoints: user and content removal, report triage and analytics.
//!
//! Every handler requires [`RequireAdmin`]. Destructive actions run in one
//! transaction together with their `admin_logs` entry.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::openapi;

use crate::auth::RequireAdmin;
use crate::error::ApiError;
use crate::models::{Analytics, DepartmentCount, MessageResponse, Report, Shoutout, UserCount, UserProfile};
use crate::routes::helpers::record_admin_action;
use crate::routes::users::load_profiles;

const TOP_CONTRIBUTORS: i64 = 5;
const MOST_TAGGED: i64 = 5;
const ACTIVE_DEPARTMENTS: i64 = 10;

/// Every user including their role.
#[openapi(tag = "Admin")]
#[get("/admin/users")]
pub async fn list_users(
    _admin: RequireAdmin,
    pool: &State<PgPool>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    Ok(Json(load_profiles(pool.inner()).await?))
}

/// Hard-delete a user; their shoutouts, comments, reactions and reports go with them.
#[openapi(tag = "Admin")]
#[delete("/admin/users/<user_id>")]
pub async fn delete_user(
    admin: RequireAdmin,
    user_id: i32,
    pool: &State<PgPool>,
) -> Result<Json<MessageResponse>, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::BadRequest(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("User {user_id} not found")));
    }
    record_admin_action(&mut *tx, admin.id, "delete_user", user_id, "user").await?;
    tx.commit().await?;

    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}

/// All shoutouts, newest first.
#[openapi(tag = "Admin")]
#[get("/admin/shoutouts")]
pub async fn list_shoutouts(
    _admin: RequireAdmin,
    pool: &State<PgPool>,
) -> Result<Json<Vec<Shoutout>>, ApiError> {
    let shoutouts = sqlx::query_as::<_, Shoutout>(
        r#"SELECT id, sender_id, message, department, image_url, created_at
           FROM shoutouts
           ORDER BY created_at DESC, id DESC"#,
    )
    .fetch_all(pool.inner())
    .await?;
    Ok(Json(shoutouts))
}

#[openapi(tag = "Admin")]
#[delete("/admin/shoutouts/<shoutout_id>")]
pub async fn delete_shoutout(
    admin: RequireAdmin,
    shoutout_id: i32,
    pool: &State<PgPool>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut tx = pool.begin().await?;
    let deleted = sqlx::query("DELETE FROM shoutouts WHERE id = $1")
        .bind(shoutout_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Shoutout {shoutout_id} not found")));
    }
    record_admin_action(&mut *tx, admin.id, "delete_shoutout", shoutout_id, "shoutout").await?;
    tx.commit().await?;

    Ok(Json(MessageResponse {
        message: "Shoutout deleted".to_string(),
    }))
}

/// Open reports, newest first.
#[openapi(tag = "Admin")]
#[get("/admin/reports")]
pub async fn list_reports(
    _admin: RequireAdmin,
    pool: &State<PgPool>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let reports = sqlx::query_as::<_, Report>(
        r#"SELECT id, shoutout_id, comment_id, reported_by, reason, created_at
           FROM reports
           ORDER BY created_at DESC, id DESC"#,
    )
    .fetch_all(pool.inner())
    .await?;
    Ok(Json(reports))
}

/// Close a report without touching the reported content.
#[openapi(tag = "Admin")]
#[post("/admin/reports/<report_id>/dismiss")]
pub async fn dismiss_report(
    admin: RequireAdmin,
    report_id: i32,
    pool: &State<PgPool>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut tx = pool.begin().await?;
    let deleted = sqlx::query("DELETE FROM reports WHERE id = $1")
        .bind(report_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Report {report_id} not found")));
    }
    record_admin_action(&mut *tx, admin.id, "dismiss_report", report_id, "report").await?;
    tx.commit().await?;

    Ok(Json(MessageResponse {
        message: "Report dismissed".to_string(),
    }))
}

/// Leaderboards for senders, recipients and departments.
#[openapi(tag = "Admin")]
#[get("/admin/analytics")]
pub async fn analytics(
    _admin: RequireAdmin,
    pool: &State<PgPool>,
) -> Result<Json<Analytics>, ApiError> {
    let pool = pool.inner();

    let top_contributors = sqlx::query_as::<_, UserCount>(
        r#"SELECT sender_id AS user_id, COUNT(*) AS count
           FROM shoutouts
           GROUP BY sender_id
           ORDER BY count DESC, sender_id ASC
           LIMIT $1"#,
    )
    .bind(TOP_CONTRIBUTORS)
    .fetch_all(pool)
    .await?;

    let most_tagged = sqlx::query_as::<_, UserCount>(
        r#"SELECT recipient_id AS user_id, COUNT(*) AS count
           FROM shoutout_recipients
           GROUP BY recipient_id
           ORDER BY count DESC, recipient_id ASC
           LIMIT $1"#,
    )
    .bind(MOST_TAGGED)
    .fetch_all(pool)
    .await?;

    let active_departments = sqlx::query_as::<_, DepartmentCount>(
        r#"SELECT department, COUNT(*) AS count
           FROM shoutouts
           GROUP BY department
           ORDER BY count DESC, department ASC NULLS LAST
           LIMIT $1"#,
    )
    .bind(ACTIVE_DEPARTMENTS)
    .fetch_all(pool)
    .await?;

    Ok(Json(Analytics {
        top_contributors,
        most_tagged,
        active_departments,
    }))
}
