use std::ops::Deref;

use rocket::Request;
use rocket::State;
use rocket::request::{FromRequest, Outcome};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use crate::auth::gate::authenticate;
use crate::auth::policy::require_admin;
use crate::auth::{AuthError, AuthState};
use crate::models::User;

/// Request-local record of who made the request, read by the request logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct Principal(pub Option<i32>);

/// Request-local record of why authentication failed, read by the 401/403
/// catchers to pick the response message.
#[derive(Debug, Clone, Default)]
pub struct AuthFailure(pub Option<String>);

/// The authenticated caller, freshly loaded from the user directory.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let state = match request.guard::<&State<AuthState>>().await.succeeded() {
            Some(state) => state,
            None => {
                return fail(request, AuthError::Config("AuthState missing from state".into()));
            }
        };

        let header = request.headers().get_one("Authorization");
        match authenticate(state, header).await {
            Ok(user) => {
                request.local_cache(|| Principal(Some(user.id)));
                Outcome::Success(AuthUser(user))
            }
            Err(err) => fail(request, err),
        }
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl Deref for RequireAdmin {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequireAdmin {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthUser::from_request(request).await {
            Outcome::Success(user) => match require_admin(&user) {
                Ok(()) => Outcome::Success(RequireAdmin(user)),
                Err(err) => fail(request, err),
            },
            Outcome::Error(err) => Outcome::Error(err),
            Outcome::Forward(_) => fail(request, AuthError::Missing),
        }
    }
}

fn fail<T>(request: &Request<'_>, err: AuthError) -> Outcome<T, AuthError> {
    if err.is_internal() {
        log::error!("authentication failed internally: {err}");
    }
    request.local_cache(|| AuthFailure(Some(err.public_message())));
    Outcome::Error((err.status(), err))
}

fn bearer_security() -> rocket_okapi::Result<RequestHeaderInput> {
    let security_scheme = SecurityScheme {
        description: Some("Access token from `POST /login`.".to_owned()),
        data: SecuritySchemeData::Http {
            scheme: "bearer".to_owned(),
            bearer_format: Some("JWT".to_owned()),
        },
        extensions: Object::default(),
    };
    let mut security_req = SecurityRequirement::new();
    security_req.insert("BearerAuth".to_owned(), Vec::new());
    Ok(RequestHeaderInput::Security(
        "BearerAuth".to_owned(),
        security_scheme,
        security_req,
    ))
}

impl<'r> OpenApiFromRequest<'r> for AuthUser {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        bearer_security()
    }
}

impl<'r> OpenApiFromRequest<'r> for RequireAdmin {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        bearer_security()
    }
}
