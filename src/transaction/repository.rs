//! Defines the transaction repository trait and an implementation for the SQLite backend.
//!
//! Every operation is scoped to the user that owns the transactions. A
//! transaction owned by someone else is indistinguishable from one that does
//! not exist.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    StorageError,
    transaction::{
        core::{TRANSACTION_COLUMNS, Transaction, TransactionId, map_transaction_row},
        query::TransactionQuery,
        validation::{NewTransaction, TransactionUpdate},
    },
    user::UserID,
};

/// The totals of a user's transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
}

/// Handles the creation, retrieval, update and deletion of transactions.
pub trait TransactionRepository {
    /// Create a new transaction owned by `owner`.
    fn create(&self, owner: UserID, data: &NewTransaction) -> Result<Transaction, StorageError>;

    /// Get the transaction with `id` if it is owned by `owner`.
    fn get_by_id(
        &self,
        owner: UserID,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StorageError>;

    /// Get every transaction owned by `owner`, newest first.
    fn get_all(&self, owner: UserID) -> Result<Vec<Transaction>, StorageError>;

    /// Get the transactions owned by `owner` that match `query`.
    fn get_by_filter(
        &self,
        owner: UserID,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, StorageError>;

    /// Overwrite the fields set in `changes` and return the updated transaction.
    fn update(
        &self,
        owner: UserID,
        id: TransactionId,
        changes: &TransactionUpdate,
    ) -> Result<Option<Transaction>, StorageError>;

    /// Overwrite every field with `data` and return the replaced transaction.
    fn replace(
        &self,
        owner: UserID,
        id: TransactionId,
        data: &NewTransaction,
    ) -> Result<Option<Transaction>, StorageError>;

    /// Delete a transaction and return the deleted record.
    fn delete(
        &self,
        owner: UserID,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StorageError>;

    /// Sum the income and expenses of `owner`.
    fn get_summary(&self, owner: UserID) -> Result<Summary, StorageError>;
}

/// Stores transactions in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionRepository {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionRepository {
    /// Create a new repository for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionRepository for SQLiteTransactionRepository {
    /// Create and insert a new transaction into the database.
    ///
    /// # Errors
    ///
    /// Returns a [StorageError] if `owner` does not refer to a stored user or
    /// there is some other SQL error.
    fn create(&self, owner: UserID, data: &NewTransaction) -> Result<Transaction, StorageError> {
        let now = OffsetDateTime::now_utc();
        let connection = self.connection.lock()?;

        let transaction = connection
            .prepare(&format!(
                "INSERT INTO \"transaction\" (user_id, type, amount, title, category, date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    owner.as_i64(),
                    data.kind,
                    data.amount,
                    data.title.as_ref(),
                    data.category,
                    data.date,
                    now,
                ),
                map_transaction_row,
            )?;

        Ok(transaction)
    }

    fn get_by_id(
        &self,
        owner: UserID,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StorageError> {
        let transaction = self
            .connection
            .lock()?
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
            ))?
            .query_row(
                &[(":id", &id.as_i64()), (":user_id", &owner.as_i64())],
                map_transaction_row,
            )
            .optional()?;

        Ok(transaction)
    }

    fn get_all(&self, owner: UserID) -> Result<Vec<Transaction>, StorageError> {
        self.get_by_filter(owner, &TransactionQuery::default())
    }

    /// Get the transactions owned by `owner` that match `query`.
    ///
    /// The WHERE clause is built from the filters that are set, and every value
    /// is bound as a parameter.
    fn get_by_filter(
        &self,
        owner: UserID,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, StorageError> {
        let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
        let mut query_parameters = vec![Value::Integer(owner.as_i64())];

        let mut push_condition = |condition: &str, value: Value| {
            query_parameters.push(value);
            where_clause_parts.push(format!("{condition} ?{}", query_parameters.len()));
        };

        if let Some(kind) = query.kind {
            push_condition("type =", Value::Text(kind.as_str().to_owned()));
        }

        if let Some(category) = query.category {
            push_condition("category =", Value::Text(category.as_str().to_owned()));
        }

        if let Some(min_amount) = query.min_amount {
            push_condition("amount >=", Value::Real(min_amount));
        }

        if let Some(max_amount) = query.max_amount {
            push_condition("amount <=", Value::Real(max_amount));
        }

        if let Some(start_date) = query.start_date {
            push_condition("date >=", Value::Text(start_date.to_string()));
        }

        if let Some(end_date) = query.end_date {
            push_condition("date <=", Value::Text(end_date.to_string()));
        }

        // Sort by ID as well to keep the order stable for equal values.
        let order = query.sort_order.keyword();
        let mut query_string = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE {} ORDER BY {} {order}, id {order}",
            where_clause_parts.join(" AND "),
            query.sort_by.column(),
        );

        if let Some(limit) = query.limit {
            query_string.push_str(&format!(" LIMIT {limit} OFFSET {}", query.offset()));
        }

        let connection = self.connection.lock()?;
        let mut statement = connection.prepare(&query_string)?;
        let transactions = statement
            .query_map(params_from_iter(query_parameters.iter()), map_transaction_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    fn update(
        &self,
        owner: UserID,
        id: TransactionId,
        changes: &TransactionUpdate,
    ) -> Result<Option<Transaction>, StorageError> {
        let transaction = self
            .connection
            .lock()?
            .prepare(&format!(
                "UPDATE \"transaction\" SET
                    type = COALESCE(?1, type),
                    amount = COALESCE(?2, amount),
                    title = COALESCE(?3, title),
                    category = COALESCE(?4, category),
                    date = COALESCE(?5, date),
                    updated_at = ?6
                 WHERE id = ?7 AND user_id = ?8
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    changes.kind,
                    changes.amount,
                    changes.title.as_ref().map(|title| title.as_ref()),
                    changes.category,
                    changes.date,
                    OffsetDateTime::now_utc(),
                    id.as_i64(),
                    owner.as_i64(),
                ),
                map_transaction_row,
            )
            .optional()?;

        Ok(transaction)
    }

    fn replace(
        &self,
        owner: UserID,
        id: TransactionId,
        data: &NewTransaction,
    ) -> Result<Option<Transaction>, StorageError> {
        let transaction = self
            .connection
            .lock()?
            .prepare(&format!(
                "UPDATE \"transaction\" SET
                    type = ?1,
                    amount = ?2,
                    title = ?3,
                    category = ?4,
                    date = ?5,
                    updated_at = ?6
                 WHERE id = ?7 AND user_id = ?8
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    data.kind,
                    data.amount,
                    data.title.as_ref(),
                    data.category,
                    data.date,
                    OffsetDateTime::now_utc(),
                    id.as_i64(),
                    owner.as_i64(),
                ),
                map_transaction_row,
            )
            .optional()?;

        Ok(transaction)
    }

    fn delete(
        &self,
        owner: UserID,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StorageError> {
        let transaction = self
            .connection
            .lock()?
            .prepare(&format!(
                "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                &[(":id", &id.as_i64()), (":user_id", &owner.as_i64())],
                map_transaction_row,
            )
            .optional()?;

        Ok(transaction)
    }

    fn get_summary(&self, owner: UserID) -> Result<Summary, StorageError> {
        let (total_income, total_expense) = self.connection.lock()?.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0.0),
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0.0)
             FROM \"transaction\" WHERE user_id = ?1",
            [owner.as_i64()],
            |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
        )?;

        Ok(Summary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        })
    }
}
