//! Business rules for registering users and managing their profiles.

use email_address::EmailAddress;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error, PasswordHash, StorageError,
    user::{
        core::{User, UserID},
        repository::{UserChanges, UserRepository},
        validation::{NewUser, UserUpdate},
    },
};

const USER_NOT_FOUND: &str = "user not found";

/// The public view of a user. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// The user's ID.
    pub id: String,
    /// The user's display name.
    pub name: String,
    /// The user's email address.
    pub email: String,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user last changed their profile.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.as_ref().to_owned(),
            email: user.email.to_string(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Map a failed insert or update to [Error::DuplicateEmail] when the email was taken.
fn map_email_conflict(error: StorageError) -> Error {
    if error.is_unique_violation() {
        Error::DuplicateEmail
    } else {
        Error::Service(error)
    }
}

/// Registers users and manages their profiles.
#[derive(Debug, Clone)]
pub struct UserService<R> {
    repository: R,
    password_cost: u32,
}

impl<R> UserService<R>
where
    R: UserRepository,
{
    /// Create a service that hashes new passwords with `password_cost`.
    pub fn new(repository: R, password_cost: u32) -> Self {
        Self {
            repository,
            password_cost,
        }
    }

    /// Hash the password and store the new user.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email is taken by another user.
    pub fn register_user(&self, new_user: NewUser) -> Result<UserResponse, Error> {
        let password_hash = PasswordHash::new(&new_user.password, self.password_cost)?;

        let user = self
            .repository
            .create(&new_user.name, &new_user.email, &password_hash)
            .map_err(map_email_conflict)?;

        tracing::info!("Registered user {}", user.id);

        Ok(user.into())
    }

    /// Get the profile of the user with `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if no such user exists.
    pub fn get_user_by_id(&self, id: UserID) -> Result<UserResponse, Error> {
        self.repository
            .get_by_id(id)?
            .map(UserResponse::from)
            .ok_or(Error::NotFound(USER_NOT_FOUND))
    }

    /// Get the user registered with `email`, including their password hash.
    pub fn get_user_by_email(&self, email: &EmailAddress) -> Result<Option<User>, Error> {
        Ok(self.repository.get_by_email(email)?)
    }

    /// Apply the changes in `update` to the profile of the user with `id`.
    ///
    /// A new password is hashed before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if no such user exists, or [Error::DuplicateEmail]
    /// if the new email belongs to a different user.
    pub fn update_profile(&self, id: UserID, update: UserUpdate) -> Result<UserResponse, Error> {
        if let Some(email) = &update.email {
            if let Some(existing_user) = self.repository.get_by_email(email)? {
                if existing_user.id != id {
                    return Err(Error::DuplicateEmail);
                }
            }
        }

        let password_hash = update
            .password
            .as_ref()
            .map(|password| PasswordHash::new(password, self.password_cost))
            .transpose()?;

        let changes = UserChanges {
            name: update.name,
            email: update.email,
            password_hash,
        };

        self.repository
            .update(id, &changes)
            .map_err(map_email_conflict)?
            .map(UserResponse::from)
            .ok_or(Error::NotFound(USER_NOT_FOUND))
    }

    /// Delete the user with `id` along with all of their transactions.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if no such user exists.
    pub fn delete_user(&self, id: UserID) -> Result<UserResponse, Error> {
        let user = self
            .repository
            .delete(id)?
            .ok_or(Error::NotFound(USER_NOT_FOUND))?;

        tracing::info!("Deleted user {}", user.id);

        Ok(user.into())
    }
}
