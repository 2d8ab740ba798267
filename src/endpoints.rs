//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/v1/transactions/{transaction_id}', use [format_endpoint].

use std::fmt::Display;

/// The route for registering a new user.
pub const USERS: &str = "/api/v1/users";
/// The route for the logged in user's profile.
pub const PROFILE: &str = "/api/v1/users/me";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/v1/auth/login";
/// The route for exchanging a refresh token for a new access token.
pub const REFRESH: &str = "/api/v1/auth/refresh";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/api/v1/transactions";
/// The route for the income, expense and balance totals.
pub const TRANSACTION_SUMMARY: &str = "/api/v1/transactions/summary";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/v1/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
