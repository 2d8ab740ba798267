//! Users, their storage, and the registration and profile endpoints.

mod core;
mod endpoints;
mod repository;
mod service;
mod validation;

pub use self::core::{UserID, create_user_table};
pub use endpoints::{
    SQLiteUserService, delete_profile_endpoint, get_profile_endpoint, register_user_endpoint,
    update_profile_endpoint,
};
pub use repository::UserRepository;
pub use service::UserService;
pub(crate) use validation::{parse_email, parse_password};

#[cfg(test)]
pub(crate) use self::{core::UserName, repository::SQLiteUserRepository};
