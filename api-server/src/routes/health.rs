//! Service health endpoints used for readiness checks and tests.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Basic response payload describing API health.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Static status string reporting application readiness.
    pub status: String,
}

/// Liveness check returning a trivial JSON payload.
#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Round-trip to the database.
#[openapi(tag = "Health")]
#[get("/health/db")]
pub async fn database_health(pool: &State<PgPool>) -> Result<Json<HealthResponse>, ApiError> {
    sqlx::query("SELECT 1").execute(pool.inner()).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}
