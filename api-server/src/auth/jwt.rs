use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::auth::{AuthConfig, AuthError, AuthResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct SignedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct JwtMetadata {
    pub algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub default_secret_in_use: bool,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    default_secret_in_use: bool,
}

impl JwtService {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        if config.access_token_ttl_minutes <= 0 {
            return Err(AuthError::Config("access token ttl must be positive".into()));
        }
        let access_token_ttl = Duration::try_minutes(config.access_token_ttl_minutes)
            .ok_or_else(|| AuthError::Config("access token ttl is out of range".into()))?;

        let secret_bytes = config.jwt_secret.as_bytes();
        let encoding_key = EncodingKey::from_secret(secret_bytes);
        let decoding_key = DecodingKey::from_secret(secret_bytes);

        let mut validation = Validation::new(config.jwt_algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_exp = true;
        // Expiry is judged against this process's clock as-is.
        validation.leeway = 0;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            algorithm: config.jwt_algorithm,
            access_token_ttl,
            default_secret_in_use: config.uses_default_secret(),
        })
    }

    pub fn issue_access_token(&self, user_id: i32) -> AuthResult<SignedAccessToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.access_token_ttl)
            .ok_or_else(|| AuthError::Config("access token expiry is past the supported date range".into()))?;

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;

        Ok(SignedAccessToken { token, expires_at })
    }

    /// Check signature and expiry, returning the subject claim. Every failure
    /// collapses into [`AuthError::InvalidOrExpired`].
    pub fn verify(&self, token: &str) -> AuthResult<String> {
        let claims = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| {
                log::debug!("rejecting access token: {err}");
                AuthError::InvalidOrExpired
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidOrExpired);
        }
        Ok(claims.sub)
    }

    pub fn metadata(&self) -> JwtMetadata {
        JwtMetadata {
            algorithm: self.algorithm,
            access_token_ttl: self.access_token_ttl,
            default_secret_in_use: self.default_secret_in_use,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_JWT_SECRET: &str = "super-secret-test-key";

    fn make_test_config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.into(),
            jwt_algorithm: Algorithm::HS256,
            access_token_ttl_minutes: 30,
            bcrypt_cost: 4,
            allow_role_selection: false,
        }
    }

    fn sign_raw(secret: &str, claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode raw token")
    }

    #[test]
    fn issues_and_verifies_access_tokens() {
        let service = JwtService::from_config(&make_test_config(TEST_JWT_SECRET)).expect("jwt service");

        let token = service.issue_access_token(42).expect("issue token");
        let subject = service.verify(&token.token).expect("verify token");

        assert_eq!(subject, "42");
        let remaining = token.expires_at - Utc::now();
        assert!(remaining <= Duration::minutes(30));
        assert!(remaining > Duration::minutes(29));
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let service = JwtService::from_config(&make_test_config(TEST_JWT_SECRET)).expect("jwt service");
        let first = service.issue_access_token(7).expect("issue");
        let second = service.issue_access_token(7).expect("issue");
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn rejects_expired_tokens() {
        let service = JwtService::from_config(&make_test_config(TEST_JWT_SECRET)).expect("jwt service");
        let now = Utc::now().timestamp();
        let token = sign_raw(
            TEST_JWT_SECRET,
            &serde_json::json!({ "sub": "42", "exp": now - 5, "iat": now - 1805, "jti": "x" }),
        );

        assert!(matches!(service.verify(&token), Err(AuthError::InvalidOrExpired)));
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let issuer = JwtService::from_config(&make_test_config("secret-one")).expect("jwt service");
        let verifier = JwtService::from_config(&make_test_config("secret-two")).expect("jwt service");

        let token = issuer.issue_access_token(42).expect("issue token");
        assert!(matches!(verifier.verify(&token.token), Err(AuthError::InvalidOrExpired)));
    }

    #[test]
    fn rejects_tokens_without_subject() {
        let service = JwtService::from_config(&make_test_config(TEST_JWT_SECRET)).expect("jwt service");
        let exp = Utc::now().timestamp() + 600;

        let missing = sign_raw(TEST_JWT_SECRET, &serde_json::json!({ "exp": exp, "iat": 0, "jti": "x" }));
        assert!(matches!(service.verify(&missing), Err(AuthError::InvalidOrExpired)));

        let empty = sign_raw(
            TEST_JWT_SECRET,
            &serde_json::json!({ "sub": "", "exp": exp, "iat": 0, "jti": "x" }),
        );
        assert!(matches!(service.verify(&empty), Err(AuthError::InvalidOrExpired)));
    }

    #[test]
    fn rejects_malformed_tokens() {
        let service = JwtService::from_config(&make_test_config(TEST_JWT_SECRET)).expect("jwt service");
        assert!(matches!(service.verify("invalid.token.here"), Err(AuthError::InvalidOrExpired)));
        assert!(matches!(service.verify(""), Err(AuthError::InvalidOrExpired)));
    }

    #[test]
    fn rejects_tokens_with_another_algorithm() {
        let mut hs512 = make_test_config(TEST_JWT_SECRET);
        hs512.jwt_algorithm = Algorithm::HS512;
        let issuer = JwtService::from_config(&hs512).expect("jwt service");
        let verifier = JwtService::from_config(&make_test_config(TEST_JWT_SECRET)).expect("jwt service");

        let token = issuer.issue_access_token(1).expect("issue");
        assert!(matches!(verifier.verify(&token.token), Err(AuthError::InvalidOrExpired)));
    }

    #[test]
    fn oversized_ttl_is_an_error_not_a_panic() {
        let mut config = make_test_config(TEST_JWT_SECRET);
        config.access_token_ttl_minutes = i64::MAX;
        assert!(matches!(JwtService::from_config(&config), Err(AuthError::Config(_))));

        config.access_token_ttl_minutes = 200_000_000_000;
        let service = JwtService::from_config(&config).expect("duration fits");
        assert!(matches!(service.issue_access_token(1), Err(AuthError::Config(_))));
    }

    #[test]
    fn metadata_reports_fallback_secret() {
        let service = JwtService::from_config(&make_test_config(crate::auth::config::DEFAULT_JWT_SECRET))
            .expect("jwt service");
        let meta = service.metadata();
        assert!(meta.default_secret_in_use);
        assert_eq!(meta.algorithm, Algorithm::HS256);
        assert_eq!(meta.access_token_ttl, Duration::minutes(30));
    }
}
