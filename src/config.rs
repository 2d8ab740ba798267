//! The authentication settings that are read once at start-up and shared by every request.

use std::fmt::Debug;

use jsonwebtoken::{DecodingKey, EncodingKey};
use time::Duration;

/// The default lifetime of an access token.
pub const DEFAULT_ACCESS_TOKEN_DURATION: Duration = Duration::minutes(15);

/// The default lifetime of a refresh token.
pub const DEFAULT_REFRESH_TOKEN_DURATION: Duration = Duration::days(7);

/// The default bcrypt cost for hashing passwords.
pub const DEFAULT_PASSWORD_COST: u32 = 10;

/// The pair of keys used to sign and verify one kind of JSON web token.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the keys for HMAC signing from `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// The key for signing tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// The key for verifying tokens.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys(********)")
    }
}

/// Settings for issuing tokens and hashing passwords.
///
/// Access and refresh tokens are signed with different secrets so that one
/// kind of token can never be accepted in place of the other.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Keys for the short-lived tokens sent with every API request.
    pub access_keys: JwtKeys,
    /// Keys for the long-lived tokens exchanged for new access tokens.
    pub refresh_keys: JwtKeys,
    /// How long an access token stays valid.
    pub access_token_duration: Duration,
    /// How long a refresh token stays valid.
    pub refresh_token_duration: Duration,
    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl AuthConfig {
    /// Create a config with the default token lifetimes and password cost.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_keys: JwtKeys::from_secret(access_secret),
            refresh_keys: JwtKeys::from_secret(refresh_secret),
            access_token_duration: DEFAULT_ACCESS_TOKEN_DURATION,
            refresh_token_duration: DEFAULT_REFRESH_TOKEN_DURATION,
            password_cost: DEFAULT_PASSWORD_COST,
        }
    }

    /// Set how long access tokens stay valid.
    pub fn access_token_duration(mut self, duration: Duration) -> Self {
        self.access_token_duration = duration;
        self
    }

    /// Set how long refresh tokens stay valid.
    pub fn refresh_token_duration(mut self, duration: Duration) -> Self {
        self.refresh_token_duration = duration;
        self
    }

    /// Set the bcrypt cost for new password hashes.
    pub fn password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}
