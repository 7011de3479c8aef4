use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;

use crate::auth::{AuthError, AuthResult};

/// Fallback signing secret used when `JWT_SECRET_KEY` is unset. Deployments
/// must override it; startup logs a warning while it is active.
pub const DEFAULT_JWT_SECRET: &str = "your_secret_key";
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Authentication configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub allow_role_selection: bool,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = match lookup("JWT_SECRET_KEY").filter(|v| !v.is_empty()) {
            Some(secret) => secret,
            None => {
                log::warn!(
                    "JWT_SECRET_KEY is not set; falling back to the built-in default secret. \
                     Tokens can be forged by anyone who knows it."
                );
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let algorithm_name = lookup("JWT_ALGORITHM").unwrap_or_else(|| "HS256".into());
        let jwt_algorithm = parse_hmac_algorithm(algorithm_name.trim())?;

        let access_token_ttl_minutes = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 && expiry_is_representable(minutes) => minutes,
                _ => {
                    log::warn!(
                        "ignoring ACCESS_TOKEN_EXPIRE_MINUTES={raw:?}; using {DEFAULT_ACCESS_TOKEN_TTL_MINUTES}"
                    );
                    DEFAULT_ACCESS_TOKEN_TTL_MINUTES
                }
            },
            None => DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
        };

        let bcrypt_cost = match lookup("BRAGBOARD_BCRYPT_COST") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|cost| (4..=31).contains(cost))
                .ok_or_else(|| {
                    AuthError::Config(format!("BRAGBOARD_BCRYPT_COST must be 4..=31, got {raw:?}"))
                })?,
            None => DEFAULT_BCRYPT_COST,
        };

        let allow_role_selection = lookup("BRAGBOARD_ALLOW_ROLE_SELECTION")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            jwt_secret,
            jwt_algorithm,
            access_token_ttl_minutes,
            bcrypt_cost,
            allow_role_selection,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

/// A token issued now must get an expiry the clock can represent.
fn expiry_is_representable(minutes: i64) -> bool {
    Duration::try_minutes(minutes)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .is_some()
}

/// Only symmetric HMAC algorithms make sense with a shared secret.
fn parse_hmac_algorithm(name: &str) -> AuthResult<Algorithm> {
    let algorithm = Algorithm::from_str(name)
        .map_err(|_| AuthError::Config(format!("unknown JWT_ALGORITHM {name:?}")))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(AuthError::Config(format!(
            "JWT_ALGORITHM {other:?} needs a key pair; only HS256, HS384 and HS512 are supported"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AuthResult<AuthConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuthConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).expect("defaults");
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert!(config.uses_default_secret());
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.access_token_ttl_minutes, 30);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(!config.allow_role_selection);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("JWT_SECRET_KEY", "s3cr3t"),
            ("JWT_ALGORITHM", "HS512"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("BRAGBOARD_BCRYPT_COST", "4"),
            ("BRAGBOARD_ALLOW_ROLE_SELECTION", "true"),
        ])
        .expect("config");
        assert_eq!(config.jwt_secret, "s3cr3t");
        assert!(!config.uses_default_secret());
        assert_eq!(config.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.access_token_ttl_minutes, 5);
        assert_eq!(config.bcrypt_cost, 4);
        assert!(config.allow_role_selection);
    }

    #[test]
    fn bad_ttl_falls_back_to_default() {
        let config = config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "-3")]).expect("config");
        assert_eq!(config.access_token_ttl_minutes, 30);
        let config = config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "soon")]).expect("config");
        assert_eq!(config.access_token_ttl_minutes, 30);
    }

    #[test]
    fn ttl_beyond_the_calendar_falls_back_to_default() {
        let config =
            config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "200000000000")]).expect("config");
        assert_eq!(config.access_token_ttl_minutes, 30);
        let config =
            config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "9223372036854775807")]).expect("config");
        assert_eq!(config.access_token_ttl_minutes, 30);

        let config = config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "525600")]).expect("config");
        assert_eq!(config.access_token_ttl_minutes, 525_600);
    }

    #[test]
    fn rejects_asymmetric_and_unknown_algorithms() {
        assert!(matches!(
            config_from(&[("JWT_ALGORITHM", "RS256")]),
            Err(AuthError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("JWT_ALGORITHM", "none")]),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_cost() {
        assert!(matches!(
            config_from(&[("BRAGBOARD_BCRYPT_COST", "2")]),
            Err(AuthError::Config(_))
        ));
    }
}
