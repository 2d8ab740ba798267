//! Authentication middleware that checks the bearer token on protected routes.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{AppState, Error, auth::token::decode_token, config::JwtKeys};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys for verifying access tokens.
    pub access_keys: JwtKeys,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            access_keys: state.auth_config.access_keys.clone(),
        }
    }
}

/// Middleware function that checks for a valid access token in the `Authorization` header.
///
/// The user ID is placed into the request and the request executed normally if the token is
/// valid. Requests without a bearer token are rejected with [Error::Unauthorized] and requests
/// with an invalid or expired token with [Error::Forbidden]. The database is never consulted.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let (mut parts, body) = request.into_parts();

    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Rejected request without a bearer token: {rejection}");
                Error::Unauthorized
            })?;

    let user_id = decode_token(bearer.token(), &state.access_keys)?;

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    Ok(next.run(request).await)
}
