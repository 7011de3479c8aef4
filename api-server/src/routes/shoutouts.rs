//! Shoutout creation and the department-filtered feed.

use std::collections::{BTreeSet, HashMap};

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgExecutor, PgPool};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{FeedItem, FeedResponse, ReactionCounts, ReactionType, Shoutout, UserRef};
use crate::routes::helpers::{optional_text, required_text};
use crate::routes::params::FeedParams;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateShoutoutRequest {
    pub message: String,
    /// Defaults to the sender's department.
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub recipient_ids: Vec<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Post a shoutout tagging zero or more colleagues.
#[openapi(tag = "Shoutouts")]
#[post("/shoutout/create", format = "json", data = "<request>")]
pub async fn create_shoutout(
    user: AuthUser,
    request: Json<CreateShoutoutRequest>,
    pool: &State<PgPool>,
) -> Result<Json<FeedItem>, ApiError> {
    let message = required_text("message", &request.message)?;
    let department =
        optional_text(request.department.as_deref()).or_else(|| user.department.clone());
    let image_url = optional_text(request.image_url.as_deref());
    let recipient_ids: Vec<i32> = request
        .recipient_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut tx = pool.begin().await?;

    let recipients: Vec<UserRef> =
        sqlx::query_as("SELECT id, name FROM users WHERE id = ANY($1) ORDER BY name ASC")
            .bind(recipient_ids.as_slice())
            .fetch_all(&mut *tx)
            .await?;
    if recipients.len() != recipient_ids.len() {
        return Err(ApiError::BadRequest("Unknown recipient".to_string()));
    }

    let shoutout: Shoutout = sqlx::query_as(
        r#"INSERT INTO shoutouts (sender_id, message, department, image_url)
           VALUES ($1, $2, $3, $4)
           RETURNING id, sender_id, message, department, image_url, created_at"#,
    )
    .bind(user.id)
    .bind(&message)
    .bind(&department)
    .bind(&image_url)
    .fetch_one(&mut *tx)
    .await?;

    if !recipient_ids.is_empty() {
        sqlx::query(
            "INSERT INTO shoutout_recipients (shoutout_id, recipient_id) SELECT $1, UNNEST($2::int[])",
        )
        .bind(shoutout.id)
        .bind(recipient_ids.as_slice())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    log::info!(
        "user {} posted shoutout {} to {} recipient(s)",
        user.id,
        shoutout.id,
        recipients.len()
    );

    Ok(Json(FeedItem {
        shoutout,
        recipients,
        reactions: ReactionCounts::default(),
        comments_count: 0,
    }))
}

/// Newest shoutouts first, with recipients, reaction and comment counts.
#[openapi(tag = "Shoutouts")]
#[get("/shoutout/feed?<params..>")]
pub async fn feed(
    _user: AuthUser,
    params: FeedParams,
    pool: &State<PgPool>,
) -> Result<Json<FeedResponse>, ApiError> {
    let pool = pool.inner();

    let shoutouts: Vec<Shoutout> = sqlx::query_as(
        r#"SELECT id, sender_id, message, department, image_url, created_at
           FROM shoutouts
           WHERE ($1::text IS NULL OR department = $1)
           ORDER BY created_at DESC, id DESC
           LIMIT $2"#,
    )
    .bind(params.department())
    .bind(params.limit())
    .fetch_all(pool)
    .await?;

    let ids: Vec<i32> = shoutouts.iter().map(|s| s.id).collect();
    if ids.is_empty() {
        return Ok(Json(FeedResponse { items: Vec::new() }));
    }

    let recipients: Vec<(i32, i32, String)> = sqlx::query_as(
        r#"SELECT r.shoutout_id, u.id, u.name
           FROM shoutout_recipients r
           JOIN users u ON u.id = r.recipient_id
           WHERE r.shoutout_id = ANY($1)
           ORDER BY r.id ASC"#,
    )
    .bind(ids.as_slice())
    .fetch_all(pool)
    .await?;

    let reactions: Vec<(i32, String, i64)> = sqlx::query_as(
        r#"SELECT shoutout_id, type, COUNT(*)
           FROM reactions
           WHERE shoutout_id = ANY($1)
           GROUP BY shoutout_id, type"#,
    )
    .bind(ids.as_slice())
    .fetch_all(pool)
    .await?;

    let comments: Vec<(i32, i64)> = sqlx::query_as(
        r#"SELECT shoutout_id, COUNT(*)
           FROM comments
           WHERE shoutout_id = ANY($1)
           GROUP BY shoutout_id"#,
    )
    .bind(ids.as_slice())
    .fetch_all(pool)
    .await?;

    Ok(Json(FeedResponse {
        items: assemble_feed(shoutouts, recipients, reactions, comments),
    }))
}

/// Reaction counts for a single shoutout.
pub(crate) async fn reaction_counts<'e, E: PgExecutor<'e>>(
    executor: E,
    shoutout_id: i32,
) -> Result<ReactionCounts, ApiError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT type, COUNT(*) FROM reactions WHERE shoutout_id = $1 GROUP BY type",
    )
    .bind(shoutout_id)
    .fetch_all(executor)
    .await?;

    let mut counts = ReactionCounts::default();
    for (kind, count) in rows {
        if let Some(kind) = ReactionType::parse(&kind) {
            counts.add(kind, count);
        }
    }
    Ok(counts)
}

/// Join the per-shoutout side tables onto the shoutouts, keeping their order.
fn assemble_feed(
    shoutouts: Vec<Shoutout>,
    recipients: Vec<(i32, i32, String)>,
    reactions: Vec<(i32, String, i64)>,
    comments: Vec<(i32, i64)>,
) -> Vec<FeedItem> {
    let mut recipients_by_shoutout: HashMap<i32, Vec<UserRef>> = HashMap::new();
    for (shoutout_id, id, name) in recipients {
        recipients_by_shoutout
            .entry(shoutout_id)
            .or_default()
            .push(UserRef { id, name });
    }

    let mut reactions_by_shoutout: HashMap<i32, ReactionCounts> = HashMap::new();
    for (shoutout_id, kind, count) in reactions {
        match ReactionType::parse(&kind) {
            Some(kind) => reactions_by_shoutout
                .entry(shoutout_id)
                .or_default()
                .add(kind, count),
            None => log::warn!("ignoring unknown reaction type '{kind}' on shoutout {shoutout_id}"),
        }
    }

    let comments_by_shoutout: HashMap<i32, i64> = comments.into_iter().collect();

    shoutouts
        .into_iter()
        .map(|shoutout| {
            let id = shoutout.id;
            FeedItem {
                shoutout,
                recipients: recipients_by_shoutout.remove(&id).unwrap_or_default(),
                reactions: reactions_by_shoutout.remove(&id).unwrap_or_default(),
                comments_count: comments_by_shoutout.get(&id).copied().unwrap_or(0),
            }
        })
        .collect()
}
