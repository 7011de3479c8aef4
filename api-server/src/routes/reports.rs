use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::helpers::{ensure_comment, ensure_shoutout, required_text};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReportShoutoutRequest {
    pub shoutout_id: i32,
    pub reason: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReportCommentRequest {
    pub comment_id: i32,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReportResponse {
    pub message: String,
    pub report_id: i32,
}

/// Flag a shoutout for admin review.
#[openapi(tag = "Reports")]
#[post("/shoutout/report", format = "json", data = "<request>")]
pub async fn report_shoutout(
    user: AuthUser,
    request: Json<ReportShoutoutRequest>,
    pool: &State<PgPool>,
) -> Result<Json<ReportResponse>, ApiError> {
    let reason = required_text("reason", &request.reason)?;
    let pool = pool.inner();
    ensure_shoutout(pool, request.shoutout_id).await?;

    let report_id: i32 = sqlx::query_scalar(
        "INSERT INTO reports (shoutout_id, reported_by, reason) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(request.shoutout_id)
    .bind(user.id)
    .bind(&reason)
    .fetch_one(pool)
    .await?;

    log::info!(
        "user {} reported shoutout {} (report {report_id})",
        user.id,
        request.shoutout_id
    );
    Ok(Json(ReportResponse {
        message: "Shoutout reported".to_string(),
        report_id,
    }))
}

/// Flag a comment for admin review.
#[openapi(tag = "Reports")]
#[post("/comment/report", format = "json", data = "<request>")]
pub async fn report_comment(
    user: AuthUser,
    request: Json<ReportCommentRequest>,
    pool: &State<PgPool>,
) -> Result<Json<ReportResponse>, ApiError> {
    let reason = required_text("reason", &request.reason)?;
    let pool = pool.inner();
    ensure_comment(pool, request.comment_id).await?;

    let report_id: i32 = sqlx::query_scalar(
        "INSERT INTO reports (comment_id, reported_by, reason) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(request.comment_id)
    .bind(user.id)
    .bind(&reason)
    .fetch_one(pool)
    .await?;

    log::info!(
        "user {} reported comment {} (report {report_id})",
        user.id,
        request.comment_id
    );
    Ok(Json(ReportResponse {
        message: "Comment reported".to_string(),
        report_id,
    }))
}
