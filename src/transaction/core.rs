//! The transaction model and the transaction table.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, user::UserID, validation::check_length};

/// A newtype wrapper for integer transaction IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TransactionId(i64);

impl TransactionId {
    /// Create a new transaction ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the transaction ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TransactionId {
    type Err = Error;

    /// Parse an ID from a path segment.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidId] if `s` is not a positive integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(Error::InvalidId),
        }
    }
}

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received, e.g., a salary.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(()),
        }
    }
}

/// The fixed set of categories a transaction can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[allow(missing_docs)]
    Food,
    #[allow(missing_docs)]
    Transport,
    #[allow(missing_docs)]
    Leisure,
    #[allow(missing_docs)]
    Health,
    #[allow(missing_docs)]
    Education,
    #[allow(missing_docs)]
    Investments,
    #[allow(missing_docs)]
    Housing,
    #[allow(missing_docs)]
    Salary,
    /// Anything that does not fit the other categories.
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Transport,
        Category::Leisure,
        Category::Health,
        Category::Education,
        Category::Investments,
        Category::Housing,
        Category::Salary,
        Category::Other,
    ];

    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Leisure => "Leisure",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Investments => "Investments",
            Category::Housing => "Housing",
            Category::Salary => "Salary",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or(())
    }
}

macro_rules! impl_text_sql {
    ($type:ty) => {
        impl ToSql for $type {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $type {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|_| FromSqlError::InvalidType)
            }
        }
    };
}

impl_text_sql!(TransactionType);
impl_text_sql!(Category);

/// A short description of a transaction: trimmed, between 5 and 40 characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTitle(String);

impl TransactionTitle {
    /// The minimum number of characters in a title.
    pub const MIN_LENGTH: usize = 5;
    /// The maximum number of characters in a title.
    pub const MAX_LENGTH: usize = 40;

    /// Create a title from `title` after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a message describing the broken rule if the trimmed title is too short or too long.
    pub fn new(title: &str) -> Result<Self, String> {
        let title = title.trim();
        check_length("title", title, Self::MIN_LENGTH, Self::MAX_LENGTH)?;

        Ok(Self(title.to_owned()))
    }

    /// Create a title without validation.
    ///
    /// The caller should ensure that the title satisfies the length rule.
    pub fn new_unchecked(title: &str) -> Self {
        Self(title.to_owned())
    }
}

impl AsRef<str> for TransactionTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An income or expense recorded by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub owner: UserID,
    /// Whether money came in or went out.
    pub kind: TransactionType,
    /// The amount of money, always positive.
    pub amount: f64,
    /// A short description of the transaction.
    pub title: TransactionTitle,
    /// The category the transaction is filed under.
    pub category: Category,
    /// When the transaction happened.
    pub date: Date,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    pub updated_at: OffsetDateTime,
}

/// Create the transaction table.
///
/// Transactions are deleted along with the user that owns them.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                amount REAL NOT NULL CHECK (amount > 0),
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

/// The columns read by [map_transaction_row], in order.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, user_id, type, amount, title, category, date, created_at, updated_at";

/// Map a database row of [TRANSACTION_COLUMNS] to a [Transaction].
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_title: String = row.get(4)?;

    Ok(Transaction {
        id: TransactionId::new(row.get(0)?),
        owner: UserID::new(row.get(1)?),
        kind: row.get(2)?,
        amount: row.get(3)?,
        title: TransactionTitle::new_unchecked(&raw_title),
        category: row.get(5)?,
        date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod core_tests {
    use std::str::FromStr;

    use crate::Error;

    use super::{Category, TransactionId, TransactionTitle, TransactionType};

    #[test]
    fn parses_positive_ids_only() {
        assert_eq!(TransactionId::from_str("12"), Ok(TransactionId::new(12)));
        assert_eq!(TransactionId::from_str("0"), Err(Error::InvalidId));
        assert_eq!(TransactionId::from_str("-3"), Err(Error::InvalidId));
        assert_eq!(
            TransactionId::from_str("65f1c0ffee"),
            Err(Error::InvalidId)
        );
    }

    #[test]
    fn category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Ok(category));
        }

        assert_eq!(Category::from_str("food"), Err(()));
    }

    #[test]
    fn transaction_type_uses_lower_case_names() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Expense).unwrap(),
            "\"expense\""
        );
        assert_eq!(
            TransactionType::from_str("income"),
            Ok(TransactionType::Income)
        );
        assert_eq!(TransactionType::from_str("Income"), Err(()));
    }

    #[test]
    fn title_is_trimmed_and_bounded() {
        assert_eq!(
            TransactionTitle::new("  Groceries ").unwrap().as_ref(),
            "Groceries"
        );
        assert_eq!(
            TransactionTitle::new("   Gas  "),
            Err("title must be at least 5 characters".to_owned())
        );
        assert_eq!(
            TransactionTitle::new(&"x".repeat(41)),
            Err("title must be at most 40 characters".to_owned())
        );
    }
}
