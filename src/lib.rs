//! fintrack is a REST API for tracking personal income and expenses.
//!
//! Users register and log in to receive a pair of JSON Web Tokens, then use the
//! access token to create, list, filter, update and delete their transactions
//! and to get a summary of their income, expenses and balance.
//!
//! The library exposes [build_router] and [AppState] so that the server binary
//! (and tests) can assemble the application around a SQLite connection.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod config;
mod db;
pub mod endpoints;
mod logging;
mod routing;
mod transaction;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Claims, PasswordHash, TokenPair, ValidatedPassword};
pub use config::{
    AuthConfig, DEFAULT_ACCESS_TOKEN_DURATION, DEFAULT_PASSWORD_COST,
    DEFAULT_REFRESH_TOKEN_DURATION, JwtKeys,
};
pub use db::{StorageError, initialize as initialize_db};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{Category, TransactionId, TransactionType};
pub use user::UserID;
pub use validation::{FieldError, ValidationErrors};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not install the Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not install the terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Every error that reaches a route handler is turned into a JSON response of
/// the form `{"status": "error", "message": ...}` by the [IntoResponse]
/// implementation, which is the only place that decides status codes.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body or query string broke one or more validation rules.
    ///
    /// The client should fix the fields listed in the error and try again.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The request body could not be parsed as JSON.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// The ID in the request path is not a valid ID.
    #[error("invalid id")]
    InvalidId,

    /// The request did not include a bearer token.
    #[error("no token provided")]
    Unauthorized,

    /// The bearer token was malformed, expired or signed with the wrong key.
    #[error("forbidden access")]
    Forbidden,

    /// The user provided an unknown email or the wrong password.
    ///
    /// Both cases share this variant so that clients cannot probe for
    /// registered email addresses.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The requested resource was not found.
    ///
    /// Resources owned by another user are reported as not found as well.
    #[error("{0}")]
    NotFound(&'static str),

    /// The email used to register or update a user is already in use.
    #[error("email already in use")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A JSON web token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// A storage operation failed underneath a service call.
    ///
    /// The wrapped error is logged and never sent to the client.
    #[error("service operation failed: {0}")]
    Service(#[from] StorageError),
}

impl Error {
    /// The HTTP status code the error is rendered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::MalformedBody(_) | Error::InvalidId => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthorized | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::HashingError(_) | Error::TokenCreation(_) | Error::Service(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Error::Validation(errors) => (
                status,
                Json(json!({
                    "status": "error",
                    "message": "validation failed",
                    "errors": errors,
                })),
            )
                .into_response(),
            // Internal errors are not intended to be shown to the client.
            error @ (Error::Service(_) | Error::HashingError(_) | Error::TokenCreation(_)) => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_response(status, "Internal Server Error")
            }
            error => error_response(status, &error.to_string()),
        }
    }
}

/// Build the JSON body shared by every error response.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "status": "error",
            "message": message,
        })),
    )
        .into_response()
}
