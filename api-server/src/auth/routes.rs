use rocket::form::Form;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;

use crate::auth::flows;
use crate::auth::guards::{AuthUser, RequireAdmin};
use crate::auth::jwt::SignedAccessToken;
use crate::auth::responses::{
    LoginForm, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SigningMetadata,
};
use crate::auth::{AuthError, AuthState};
use crate::models::UserProfile;

type AuthRouteResult<T> = Result<Json<T>, status::Custom<Json<AuthErrorResponse>>>;

#[derive(Debug, serde::Serialize, serde::Deserialize, JsonSchema)]
pub struct AuthErrorResponse {
    pub status: u16,
    pub message: String,
}

/// Create an employee account.
#[openapi(tag = "Auth")]
#[post("/register", format = "json", data = "<payload>")]
pub async fn register(
    state: &State<AuthState>,
    payload: Json<RegisterRequest>,
) -> AuthRouteResult<RegisterResponse> {
    let user_id = flows::register(state, payload.into_inner())
        .await
        .map_err(respond_error)?;

    Ok(Json(RegisterResponse {
        message: "User created successfully".to_string(),
        user_id,
    }))
}

/// Exchange email and password for a bearer token.
#[openapi(tag = "Auth")]
#[post("/login", format = "json", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    payload: Json<LoginRequest>,
) -> AuthRouteResult<LoginResponse> {
    let token = flows::login(state, &payload.email, payload.password.as_deref())
        .await
        .map_err(respond_error)?;
    Ok(Json(token_response(token)))
}

/// Form-encoded variant of `/login` (`username` carries the email).
#[openapi(skip)]
#[post("/login", format = "form", data = "<form>", rank = 2)]
pub async fn login_form(
    state: &State<AuthState>,
    form: Form<LoginForm>,
) -> AuthRouteResult<LoginResponse> {
    let token = flows::login(state, &form.username, form.password.as_deref())
        .await
        .map_err(respond_error)?;
    Ok(Json(token_response(token)))
}

/// Profile of the caller.
#[openapi(tag = "Auth")]
#[get("/user/me")]
pub async fn me(user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&*user))
}

/// Token signing parameters, without the secret.
#[openapi(tag = "Admin")]
#[get("/admin/auth/metadata")]
pub async fn signing_metadata(
    state: &State<AuthState>,
    _admin: RequireAdmin,
) -> Json<SigningMetadata> {
    let meta = state.jwt_service.metadata();
    Json(SigningMetadata {
        algorithm: format!("{:?}", meta.algorithm),
        access_token_ttl_minutes: meta.access_token_ttl.num_minutes(),
        default_secret_in_use: meta.default_secret_in_use,
    })
}

fn token_response(token: SignedAccessToken) -> LoginResponse {
    LoginResponse {
        access_token: token.token,
        token_type: "bearer".to_string(),
        expires_at: token.expires_at,
    }
}

pub(crate) fn respond_error(err: AuthError) -> status::Custom<Json<AuthErrorResponse>> {
    if err.is_internal() {
        log::error!("auth request failed: {err}");
    }
    respond_message(err.status(), err.public_message())
}

pub(crate) fn respond_message(
    status: Status,
    message: impl Into<String>,
) -> status::Custom<Json<AuthErrorResponse>> {
    status::Custom(
        status,
        Json(AuthErrorResponse {
            status: status.code,
            message: message.into(),
        }),
    )
}
