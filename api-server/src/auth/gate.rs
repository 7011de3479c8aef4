//! Resolves a bearer credential to the current user record.

use crate::auth::{AuthError, AuthResult, AuthState};
use crate::models::User;

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::Missing)?;
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::Missing)
    }
}

/// Verify the token, then re-read the user it names. A token for a user who
/// no longer exists is reported exactly like a bad token.
pub async fn authenticate(state: &AuthState, authorization: Option<&str>) -> AuthResult<User> {
    let token = bearer_token(authorization)?;
    let subject = state.jwt_service.verify(token)?;
    let user_id: i32 = subject.parse().map_err(|_| AuthError::InvalidOrExpired)?;

    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::InvalidOrExpired)
}
