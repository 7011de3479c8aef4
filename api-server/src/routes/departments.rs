use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DepartmentsResponse {
    pub departments: Vec<String>,
}

/// Known department names, alphabetically.
#[openapi(tag = "Departments")]
#[get("/departments")]
pub async fn list_departments(pool: &State<PgPool>) -> Result<Json<DepartmentsResponse>, ApiError> {
    let departments: Vec<String> =
        sqlx::query_scalar("SELECT name FROM departments ORDER BY name ASC")
            .fetch_all(pool.inner())
            .await?;
    Ok(Json(DepartmentsResponse { departments }))
}
