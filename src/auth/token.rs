//! Issuing and verifying the JSON web tokens used for bearer authentication.

use jsonwebtoken::{Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    config::{AuthConfig, JwtKeys},
    user::UserID,
};

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The time the token was issued, as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token, as a unix timestamp.
    pub exp: i64,
}

/// The tokens returned by a successful log in.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// The token to send with every API request.
    pub access_token: String,
    /// The token to exchange for a new access token once the current one expires.
    pub refresh_token: String,
}

/// A new access token issued for a refresh token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// The token to send with every API request.
    pub access_token: String,
}

/// Sign a token for `user_id` that expires after `duration`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(user_id: UserID, keys: &JwtKeys, duration: Duration) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, keys.encoding_key())
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and get the ID of the user it was issued to.
///
/// # Errors
///
/// Returns an [Error::Forbidden] if the signature does not match `keys`, the
/// token has expired, or the subject is not a user ID.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<UserID, Error> {
    let token_data = decode::<Claims>(token, keys.decoding_key(), &Validation::default())
        .map_err(|error| {
            tracing::debug!("Rejected token: {error}");
            Error::Forbidden
        })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map(UserID::new)
        .map_err(|_| {
            tracing::debug!("Rejected token with subject {:?}", token_data.claims.sub);
            Error::Forbidden
        })
}

/// Issue an access token and a refresh token for `user_id`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if either token could not be signed.
pub fn issue_token_pair(user_id: UserID, config: &AuthConfig) -> Result<TokenPair, Error> {
    Ok(TokenPair {
        access_token: encode_token(user_id, &config.access_keys, config.access_token_duration)?,
        refresh_token: encode_token(
            user_id,
            &config.refresh_keys,
            config.refresh_token_duration,
        )?,
    })
}

#[cfg(test)]
mod token_tests {
    use time::Duration;

    use crate::{Error, UserID, config::AuthConfig};

    use super::{decode_token, encode_token, issue_token_pair};

    fn get_config() -> AuthConfig {
        AuthConfig::new("access-secret", "refresh-secret")
    }

    #[test]
    fn decode_gives_back_user_id() {
        let config = get_config();
        let user_id = UserID::new(42);

        let token = encode_token(user_id, &config.access_keys, Duration::minutes(5)).unwrap();

        assert_eq!(decode_token(&token, &config.access_keys), Ok(user_id));
    }

    #[test]
    fn expired_token_is_forbidden() {
        let config = get_config();

        // Past the default leeway of one minute.
        let token =
            encode_token(UserID::new(1), &config.access_keys, Duration::minutes(-5)).unwrap();

        assert_eq!(
            decode_token(&token, &config.access_keys),
            Err(Error::Forbidden)
        );
    }

    #[test]
    fn garbage_token_is_forbidden() {
        let config = get_config();

        assert_eq!(
            decode_token("not.a.token", &config.access_keys),
            Err(Error::Forbidden)
        );
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let config = get_config();

        let tokens = issue_token_pair(UserID::new(1), &config).unwrap();

        assert_eq!(
            decode_token(&tokens.refresh_token, &config.access_keys),
            Err(Error::Forbidden)
        );
        assert_eq!(
            decode_token(&tokens.access_token, &config.refresh_keys),
            Err(Error::Forbidden)
        );
        assert_eq!(
            decode_token(&tokens.refresh_token, &config.refresh_keys),
            Ok(UserID::new(1))
        );
    }

    #[test]
    fn token_pair_serializes_in_camel_case() {
        let tokens = super::TokenPair {
            access_token: "a".to_owned(),
            refresh_token: "r".to_owned(),
        };

        let json = serde_json::to_string(&tokens).unwrap();

        assert_eq!(json, r#"{"accessToken":"a","refreshToken":"r"}"#);
    }
}
