use crate::auth::{AuthError, AuthResult};

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Cut `password` to at most [`MAX_PASSWORD_BYTES`] bytes of UTF-8, dropping a
/// character that would be split by the cut.
pub fn truncate_password(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password;
    }
    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    &password[..end]
}

#[derive(Clone)]
pub struct PasswordService {
    cost: u32,
    // Verified against when the account does not exist, so the unknown-email
    // path costs the same as a wrong password.
    dummy_hash: String,
}

impl PasswordService {
    pub fn new(cost: u32) -> AuthResult<Self> {
        if !(4..=31).contains(&cost) {
            return Err(AuthError::Config(format!("bcrypt cost {cost} out of range")));
        }
        let dummy_hash = bcrypt::hash("bragboard-timing-equalizer", cost)?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        Ok(bcrypt::hash(truncate_password(password), self.cost)?)
    }

    pub fn verify_password(&self, password: &str, encoded: &str) -> AuthResult<bool> {
        Ok(bcrypt::verify(truncate_password(password), encoded)?)
    }

    /// Spend one verification worth of CPU without checking anything.
    pub fn burn_verification(&self, password: &str) {
        let _ = bcrypt::verify(truncate_password(password), &self.dummy_hash);
    }
}
