//! Defines the user repository trait and an implementation for the SQLite backend.

use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::{
    PasswordHash, StorageError,
    user::core::{USER_COLUMNS, User, UserID, UserName, map_user_row},
};

/// The fields of a user to overwrite. Fields set to `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    /// The new display name.
    pub name: Option<UserName>,
    /// The new email address.
    pub email: Option<EmailAddress>,
    /// The hash of the new password.
    pub password_hash: Option<PasswordHash>,
}

/// Handles the creation, retrieval, update and deletion of users.
pub trait UserRepository {
    /// Create a new user.
    fn create(
        &self,
        name: &UserName,
        email: &EmailAddress,
        password_hash: &PasswordHash,
    ) -> Result<User, StorageError>;

    /// Get a user by their ID.
    fn get_by_id(&self, id: UserID) -> Result<Option<User>, StorageError>;

    /// Get a user by their email.
    fn get_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StorageError>;

    /// Overwrite the fields set in `changes` and return the updated user.
    fn update(&self, id: UserID, changes: &UserChanges) -> Result<Option<User>, StorageError>;

    /// Delete a user and return the deleted record.
    fn delete(&self, id: UserID) -> Result<Option<User>, StorageError>;
}

/// Stores users in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserRepository {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserRepository {
    /// Create a new repository for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserRepository for SQLiteUserRepository {
    /// Create and insert a new user into the database.
    ///
    /// # Errors
    ///
    /// Returns a [StorageError] that [StorageError::is_unique_violation] if the email is taken.
    fn create(
        &self,
        name: &UserName,
        email: &EmailAddress,
        password_hash: &PasswordHash,
    ) -> Result<User, StorageError> {
        let now = OffsetDateTime::now_utc();
        let connection = self.connection.lock()?;

        let user = connection
            .prepare(&format!(
                "INSERT INTO user (name, email, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 RETURNING {USER_COLUMNS}"
            ))?
            .query_row(
                (name.as_ref(), email.as_str(), password_hash.as_ref(), now),
                map_user_row,
            )?;

        Ok(user)
    }

    fn get_by_id(&self, id: UserID) -> Result<Option<User>, StorageError> {
        let user = self
            .connection
            .lock()?
            .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
            .query_row(&[(":id", &id.as_i64())], map_user_row)
            .optional()?;

        Ok(user)
    }

    fn get_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StorageError> {
        let user = self
            .connection
            .lock()?
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
            ))?
            .query_row(&[(":email", email.as_str())], map_user_row)
            .optional()?;

        Ok(user)
    }

    fn update(&self, id: UserID, changes: &UserChanges) -> Result<Option<User>, StorageError> {
        let user = self
            .connection
            .lock()?
            .prepare(&format!(
                "UPDATE user SET
                    name = COALESCE(?1, name),
                    email = COALESCE(?2, email),
                    password = COALESCE(?3, password),
                    updated_at = ?4
                 WHERE id = ?5
                 RETURNING {USER_COLUMNS}"
            ))?
            .query_row(
                (
                    changes.name.as_ref().map(|name| name.as_ref()),
                    changes.email.as_ref().map(|email| email.as_str()),
                    changes.password_hash.as_ref().map(|hash| hash.as_ref()),
                    OffsetDateTime::now_utc(),
                    id.as_i64(),
                ),
                map_user_row,
            )
            .optional()?;

        Ok(user)
    }

    fn delete(&self, id: UserID) -> Result<Option<User>, StorageError> {
        let user = self
            .connection
            .lock()?
            .prepare(&format!(
                "DELETE FROM user WHERE id = :id RETURNING {USER_COLUMNS}"
            ))?
            .query_row(&[(":id", &id.as_i64())], map_user_row)
            .optional()?;

        Ok(user)
    }
}
