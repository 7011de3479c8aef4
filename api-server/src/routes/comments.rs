//! Comment threads under a shoutout.

use chrono::{DateTime, Utc};
use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{CommentView, UserRef};
use crate::routes::helpers::{ensure_shoutout, required_text};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddCommentRequest {
    pub shoutout_id: i32,
    pub content: String,
}

type CommentRow = (i32, i32, String, Option<DateTime<Utc>>, Option<i32>, Option<String>);

fn comment_from_row(
    (id, shoutout_id, content, created_at, user_id, user_name): CommentRow,
) -> CommentView {
    let user = match (user_id, user_name) {
        (Some(id), Some(name)) => Some(UserRef { id, name }),
        _ => None,
    };
    CommentView {
        id,
        shoutout_id,
        content,
        created_at,
        user,
    }
}

/// Comments on a shoutout, oldest first.
#[openapi(tag = "Comments")]
#[get("/comment/fetch/<shoutout_id>")]
pub async fn fetch_comments(
    _user: AuthUser,
    shoutout_id: i32,
    pool: &State<PgPool>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let pool = pool.inner();
    ensure_shoutout(pool, shoutout_id).await?;

    let rows: Vec<CommentRow> = sqlx::query_as(
        r#"SELECT c.id, c.shoutout_id, c.content, c.created_at, u.id, u.name
           FROM comments c
           LEFT JOIN users u ON u.id = c.user_id
           WHERE c.shoutout_id = $1
           ORDER BY c.created_at ASC, c.id ASC"#,
    )
    .bind(shoutout_id)
    .fetch_all(pool)
    .await?;

    Ok(Json(rows.into_iter().map(comment_from_row).collect()))
}

#[openapi(tag = "Comments")]
#[post("/comment/add", format = "json", data = "<request>")]
pub async fn add_comment(
    user: AuthUser,
    request: Json<AddCommentRequest>,
    pool: &State<PgPool>,
) -> Result<Json<CommentView>, ApiError> {
    let content = required_text("content", &request.content)?;
    let pool = pool.inner();
    ensure_shoutout(pool, request.shoutout_id).await?;

    let (id, created_at): (i32, Option<DateTime<Utc>>) = sqlx::query_as(
        r#"INSERT INTO comments (shoutout_id, user_id, content)
           VALUES ($1, $2, $3)
           RETURNING id, created_at"#,
    )
    .bind(request.shoutout_id)
    .bind(user.id)
    .bind(&content)
    .fetch_one(pool)
    .await?;

    log::info!("user {} commented on shoutout {}", user.id, request.shoutout_id);

    Ok(Json(CommentView {
        id,
        shoutout_id: request.shoutout_id,
        content,
        created_at,
        user: Some(UserRef {
            id: user.id,
            name: user.name.clone(),
        }),
    }))
}
