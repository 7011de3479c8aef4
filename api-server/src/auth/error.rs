use rocket::http::Status;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated")]
    Missing,
    #[error("invalid or expired token")]
    InvalidOrExpired,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("forbidden")]
    Forbidden,
    #[error("email already registered")]
    Conflict,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::Missing | AuthError::InvalidOrExpired | AuthError::InvalidCredentials => {
                Status::Unauthorized
            }
            AuthError::Forbidden => Status::Forbidden,
            AuthError::Conflict | AuthError::Validation(_) => Status::BadRequest,
            AuthError::Persistence(_)
            | AuthError::Config(_)
            | AuthError::Jwt(_)
            | AuthError::PasswordHash(_) => Status::InternalServerError,
        }
    }

    /// Message safe to hand back to the caller. Internal failures collapse to
    /// fixed strings.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Missing => "Not authenticated".into(),
            AuthError::InvalidOrExpired => "Invalid or expired token".into(),
            AuthError::InvalidCredentials => "Invalid email or password".into(),
            AuthError::Forbidden => "Admin privileges required".into(),
            AuthError::Conflict => "Email already registered".into(),
            AuthError::Validation(msg) => msg.clone(),
            AuthError::Persistence(_) => "An error occurred while saving user data.".into(),
            AuthError::Config(_) | AuthError::Jwt(_) | AuthError::PasswordHash(_) => {
                "Internal server error".into()
            }
        }
    }

    pub(crate) fn is_internal(&self) -> bool {
        self.status() == Status::InternalServerError
    }
}
