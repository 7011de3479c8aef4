//! JSON renderings of Rocket's error statuses.

use rocket::http::{Header, Status};
use rocket::response::{self, Responder, status};
use rocket::serde::json::Json;
use rocket::{Catcher, Request, Response, catch, catchers};

use crate::auth::guards::AuthFailure;
use crate::auth::routes::{AuthErrorResponse, respond_message};

/// 401 body plus the `WWW-Authenticate: Bearer` challenge.
pub struct BearerChallenge(status::Custom<Json<AuthErrorResponse>>);

impl<'r> Responder<'r, 'static> for BearerChallenge {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        Response::build_from(self.0.respond_to(request)?)
            .header(Header::new("WWW-Authenticate", "Bearer"))
            .ok()
    }
}

fn failure_message(request: &Request<'_>, fallback: &str) -> String {
    request
        .local_cache(AuthFailure::default)
        .0
        .clone()
        .unwrap_or_else(|| fallback.to_string())
}

#[catch(401)]
pub fn unauthorized(request: &Request<'_>) -> BearerChallenge {
    BearerChallenge(respond_message(
        Status::Unauthorized,
        failure_message(request, "Not authenticated"),
    ))
}

#[catch(403)]
pub fn forbidden(request: &Request<'_>) -> status::Custom<Json<AuthErrorResponse>> {
    respond_message(
        Status::Forbidden,
        failure_message(request, "Admin privileges required"),
    )
}

#[catch(404)]
pub fn not_found() -> status::Custom<Json<AuthErrorResponse>> {
    respond_message(Status::NotFound, "Not found")
}

#[catch(422)]
pub fn unprocessable() -> status::Custom<Json<AuthErrorResponse>> {
    respond_message(Status::UnprocessableEntity, "Request body could not be parsed")
}

#[catch(500)]
pub fn internal_error(request: &Request<'_>) -> status::Custom<Json<AuthErrorResponse>> {
    respond_message(
        Status::InternalServerError,
        failure_message(request, "Internal server error"),
    )
}

pub fn all() -> Vec<Catcher> {
    catchers![unauthorized, forbidden, not_found, unprocessable, internal_error]
}
