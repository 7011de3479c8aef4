//! Registration and login on top of the password, token and directory services.

use crate::auth::jwt::SignedAccessToken;
use crate::auth::responses::{RegisterRequest, Role};
use crate::auth::{AuthError, AuthResult, AuthState};
use crate::models::NewUser;

/// Create an account and return its id.
pub async fn register(state: &AuthState, request: RegisterRequest) -> AuthResult<i32> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("Name is required".into()));
    }
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::Validation("A valid email is required".into()));
    }

    let role = resolve_requested_role(state, request.role.as_deref())?;

    if state.users.find_by_email(email).await?.is_some() {
        return Err(AuthError::Conflict);
    }

    let password_hash = state
        .password_service
        .hash_password(request.password.as_deref().unwrap_or_default())?;

    let department = request
        .department
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let user = state
        .users
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            department,
            designation: None,
            profile_pic: None,
            role,
        })
        .await
        .map_err(|err| {
            if err.is_internal() {
                log::error!("failed to persist user {email}: {err}");
            }
            err
        })?;

    log::info!("registered user {} ({})", user.id, role.as_str());
    Ok(user.id)
}

/// Self-service registration may only pick a role when the deployment opts in.
fn resolve_requested_role(state: &AuthState, requested: Option<&str>) -> AuthResult<Role> {
    let Some(raw) = requested.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Role::Employee);
    };
    let role = Role::parse(raw)
        .ok_or_else(|| AuthError::Validation(format!("Unknown role '{raw}'")))?;

    if role != Role::Employee && !state.config.allow_role_selection {
        log::warn!(
            "registration requested role '{}' but role selection is disabled; assigning employee",
            role.as_str()
        );
        return Ok(Role::Employee);
    }
    Ok(role)
}

/// Check credentials and mint an access token. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn login(
    state: &AuthState,
    email: &str,
    password: Option<&str>,
) -> AuthResult<SignedAccessToken> {
    let password = password.unwrap_or_default();
    // Same normalization as registration.
    let email = email.trim();

    let Some(user) = state.users.find_by_email(email).await? else {
        state.password_service.burn_verification(password);
        return Err(AuthError::InvalidCredentials);
    };

    if !state.password_service.verify_password(password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }

    state.jwt_service.issue_access_token(user.id)
}
