//! Database set up and the error type shared by the repositories.

use std::sync::PoisonError;

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{transaction::create_transaction_table, user::create_user_table};

/// Errors originating from operations on the app's database.
///
/// Repositories wrap every failure in this type so that raw driver errors never
/// reach the services.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StorageError {
    /// The lock guarding the database connection was poisoned by a panic in
    /// another thread.
    #[error("could not acquire the database lock")]
    Lock,

    /// An error reported by SQLite.
    #[error("an unexpected SQL error occurred: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl StorageError {
    /// Whether the error was caused by a UNIQUE constraint failing.
    pub fn is_unique_violation(&self) -> bool {
        // Code 2067 occurs when a UNIQUE constraint failed.
        matches!(
            self,
            StorageError::Sql(rusqlite::Error::SqliteFailure(error, _))
                if error.extended_code == 2067
        )
    }

    /// Whether the error was caused by a FOREIGN KEY constraint failing.
    pub fn is_foreign_key_violation(&self) -> bool {
        // Code 787 occurs when a row refers to a parent row that does not exist.
        matches!(
            self,
            StorageError::Sql(rusqlite::Error::SqliteFailure(error, _))
                if error.extended_code == 787
        )
    }
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(_: PoisonError<T>) -> Self {
        StorageError::Lock
    }
}

/// Create the tables for the domain models and turn on foreign key checks.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Foreign keys are a per-connection setting and cannot be changed inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()
}
