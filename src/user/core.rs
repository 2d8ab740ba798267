//! The user model and the user table.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{PasswordHash, validation::check_length};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The display name of a user: trimmed, between 4 and 50 characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    /// The minimum number of characters in a name.
    pub const MIN_LENGTH: usize = 4;
    /// The maximum number of characters in a name.
    pub const MAX_LENGTH: usize = 50;

    /// Create a user name from `name` after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a message describing the broken rule if the trimmed name is too short or too long.
    pub fn new(name: &str) -> Result<Self, String> {
        let name = name.trim();
        check_length("name", name, Self::MIN_LENGTH, Self::MAX_LENGTH)?;

        Ok(Self(name.to_owned()))
    }

    /// Create a user name without validation.
    ///
    /// The caller should ensure that the name satisfies the length rule.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A user of the application.
///
/// The caller should ensure that `id` and `email` are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user registered with.
    pub name: UserName,
    /// The user's email address, stored in lower case.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
    /// When the user last changed their profile.
    pub updated_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// The columns read by [map_user_row], in order.
pub(crate) const USER_COLUMNS: &str = "id, name, email, password, created_at, updated_at";

/// Map a database row of [USER_COLUMNS] to a [User].
pub(crate) fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_name: String = row.get(1)?;
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        name: UserName::new_unchecked(&raw_name),
        email: EmailAddress::new_unchecked(raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
