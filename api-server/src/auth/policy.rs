use crate::auth::responses::Role;
use crate::auth::{AuthError, AuthResult};
use crate::models::User;

/// Admit only users whose role is exactly `admin`. A missing or unrecognized
/// role is denied.
pub fn require_admin(user: &User) -> AuthResult<()> {
    match user.role {
        Some(Role::Admin) => Ok(()),
        Some(Role::Employee) | None => Err(AuthError::Forbidden),
    }
}
