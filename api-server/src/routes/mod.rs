//! HTTP route handlers grouped by resource domain.
//!
//! Each submodule corresponds to a logical area of the API
//! (shoutouts, comments, moderation, etc.) and exposes typed Rocket
//! handlers annotated with `#[openapi]` so `rocket_okapi` can derive
//! an OpenAPI document automatically. Authentication routes live in
//! [`crate::auth::routes`].

pub mod admin;
pub mod comments;
pub mod departments;
pub mod health;
pub(crate) mod helpers;
pub mod params;
pub mod reactions;
pub mod reports;
pub mod shoutouts;
pub mod users;
