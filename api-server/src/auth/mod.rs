//! Authentication module: configuration, credential hashing, token minting,
//! the bearer-token gate, the admin policy, Rocket request guards and the
//! register/login route handlers.

use std::sync::Arc;

pub mod config;
pub mod directory;
pub mod error;
pub mod flows;
pub mod gate;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod policy;
pub mod responses;
pub mod routes;

pub use config::AuthConfig;
pub use directory::{PgUserDirectory, UserDirectory};
pub use error::{AuthError, AuthResult};
pub use guards::{AuthUser, RequireAdmin};
pub use jwt::JwtService;
pub use passwords::PasswordService;

/// Shared, read-only authentication services managed as Rocket state.
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub password_service: Arc<PasswordService>,
    pub jwt_service: Arc<JwtService>,
    pub users: Arc<dyn UserDirectory>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        password_service: PasswordService,
        jwt_service: JwtService,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            config,
            password_service: Arc::new(password_service),
            jwt_service: Arc::new(jwt_service),
            users,
        }
    }

    /// Build every service from a loaded configuration.
    pub fn from_config(config: AuthConfig, users: Arc<dyn UserDirectory>) -> AuthResult<Self> {
        let password_service = PasswordService::new(config.bcrypt_cost)?;
        let jwt_service = JwtService::from_config(&config)?;
        Ok(Self::new(config, password_service, jwt_service, users))
    }
}
