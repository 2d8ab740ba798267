//! Password hashing, JSON web tokens, the auth middleware and the log in endpoints.

mod log_in;
mod middleware;
mod password;
mod token;

pub use log_in::{post_log_in, post_refresh};
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use token::{Claims, TokenPair};
