//! Logging in with an email and password, and refreshing access tokens.

use axum::{
    Json,
    extract::{FromRef, State},
};
use email_address::EmailAddress;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    AppState, Error, ValidatedPassword,
    auth::token::{AccessToken, TokenPair, decode_token, encode_token, issue_token_pair},
    config::AuthConfig,
    user::{SQLiteUserService, UserRepository, UserService, parse_email, parse_password},
    validation::{Validate, ValidJson, ValidationErrors, as_trimmed_string, required},
};

/// The log in payload as sent by the client, before validation.
#[derive(Debug, Deserialize)]
pub struct RawCredentials {
    email: Option<Value>,
    password: Option<Value>,
}

/// The email and password entered during log in.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    /// Email entered during log in.
    pub email: EmailAddress,
    /// Password entered during log in.
    pub password: ValidatedPassword,
}

impl Validate for Credentials {
    type Raw = RawCredentials;

    fn validate(raw: RawCredentials) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let email = errors.check("email", required("email", raw.email).and_then(parse_email));
        let password = errors.check(
            "password",
            required("password", raw.password).and_then(parse_password),
        );

        match (email, password) {
            (Some(email), Some(password)) => Ok(Self { email, password }),
            _ => Err(errors),
        }
    }
}

/// The refresh payload as sent by the client, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRefreshRequest {
    refresh_token: Option<Value>,
}

/// A request to exchange a refresh token for a new access token.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshRequest {
    /// The refresh token issued at log in.
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    type Raw = RawRefreshRequest;

    fn validate(raw: RawRefreshRequest) -> Result<Self, ValidationErrors> {
        let refresh_token = required("refreshToken", raw.refresh_token)
            .and_then(|value| as_trimmed_string("refreshToken", &value))
            .and_then(|token| {
                if token.is_empty() {
                    Err("refreshToken must not be empty".to_owned())
                } else {
                    Ok(token)
                }
            })
            .map_err(|message| ValidationErrors::single("refreshToken", message))?;

        Ok(Self { refresh_token })
    }
}

/// Check `credentials` against the stored user and issue a token pair.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is unknown or the password
/// is wrong. Both cases give the same error.
pub fn log_in<R>(
    credentials: &Credentials,
    users: &UserService<R>,
    config: &AuthConfig,
) -> Result<TokenPair, Error>
where
    R: UserRepository,
{
    let user = users
        .get_user_by_email(&credentials.email)?
        .ok_or(Error::InvalidCredentials)?;

    match user.password_hash.verify(credentials.password.expose()) {
        Ok(true) => {
            tracing::info!("User {} logged in", user.id);
            issue_token_pair(user.id, config)
        }
        Ok(false) => Err(Error::InvalidCredentials),
        Err(error) => Err(Error::HashingError(error.to_string())),
    }
}

/// Issue a new access token for the user a valid `refresh_token` was issued to.
///
/// # Errors
///
/// Returns [Error::Forbidden] if the refresh token is invalid or expired.
pub fn refresh_access_token(refresh_token: &str, config: &AuthConfig) -> Result<AccessToken, Error> {
    let user_id = decode_token(refresh_token, &config.refresh_keys)?;

    Ok(AccessToken {
        access_token: encode_token(user_id, &config.access_keys, config.access_token_duration)?,
    })
}

/// The state needed for logging in and refreshing tokens.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The service for looking up users.
    pub user_service: SQLiteUserService,
    /// The keys and lifetimes for new tokens.
    pub auth_config: AuthConfig,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            user_service: SQLiteUserService::from_ref(state),
            auth_config: state.auth_config.clone(),
        }
    }
}

/// A route handler for logging in, responds with an access token and a refresh token.
pub async fn post_log_in(
    State(state): State<LogInState>,
    ValidJson(credentials): ValidJson<Credentials>,
) -> Result<Json<TokenPair>, Error> {
    log_in(&credentials, &state.user_service, &state.auth_config).map(Json)
}

/// A route handler for exchanging a refresh token for a new access token.
pub async fn post_refresh(
    State(state): State<LogInState>,
    ValidJson(request): ValidJson<RefreshRequest>,
) -> Result<Json<AccessToken>, Error> {
    refresh_access_token(&request.refresh_token, &state.auth_config).map(Json)
}
