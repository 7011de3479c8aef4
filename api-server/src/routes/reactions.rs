use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{ReactionCounts, ReactionType};
use crate::routes::helpers::ensure_shoutout;
use crate::routes::shoutouts::reaction_counts;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ToggleReactionRequest {
    pub shoutout_id: i32,
    #[serde(rename = "type")]
    pub kind: ReactionType,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ToggleReactionResponse {
    pub shoutout_id: i32,
    #[serde(rename = "type")]
    pub kind: ReactionType,
    /// Whether the caller's reaction exists after the toggle.
    pub active: bool,
    pub counts: ReactionCounts,
}

/// Add the caller's reaction of the given type, or remove it if already present.
#[openapi(tag = "Reactions")]
#[post("/reaction/toggle", format = "json", data = "<request>")]
pub async fn toggle_reaction(
    user: AuthUser,
    request: Json<ToggleReactionRequest>,
    pool: &State<PgPool>,
) -> Result<Json<ToggleReactionResponse>, ApiError> {
    let request = request.into_inner();
    let mut tx = pool.begin().await?;

    ensure_shoutout(&mut *tx, request.shoutout_id).await?;

    let removed = sqlx::query(
        "DELETE FROM reactions WHERE shoutout_id = $1 AND user_id = $2 AND type = $3",
    )
    .bind(request.shoutout_id)
    .bind(user.id)
    .bind(request.kind.as_str())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let active = if removed > 0 {
        false
    } else {
        sqlx::query(
            r#"INSERT INTO reactions (shoutout_id, user_id, type) VALUES ($1, $2, $3)
               ON CONFLICT (shoutout_id, user_id, type) DO NOTHING"#,
        )
        .bind(request.shoutout_id)
        .bind(user.id)
        .bind(request.kind.as_str())
        .execute(&mut *tx)
        .await?;
        true
    };

    let counts = reaction_counts(&mut *tx, request.shoutout_id).await?;
    tx.commit().await?;

    log::debug!(
        "user {} {} {} on shoutout {}",
        user.id,
        if active { "added" } else { "removed" },
        request.kind.as_str(),
        request.shoutout_id
    );

    Ok(Json(ToggleReactionResponse {
        shoutout_id: request.shoutout_id,
        kind: request.kind,
        active,
        counts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_type_field_name() {
        let request: ToggleReactionRequest =
            serde_json::from_str(r#"{"shoutout_id": 7, "type": "clap"}"#).expect("parse");
        assert_eq!(request.shoutout_id, 7);
        assert_eq!(request.kind, ReactionType::Clap);

        assert!(serde_json::from_str::<ToggleReactionRequest>(
            r#"{"shoutout_id": 7, "type": "love"}"#
        )
        .is_err());
    }
}
