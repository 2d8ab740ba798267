//! Business rules for managing a user's transactions.

use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    transaction::{
        core::{Category, Transaction, TransactionId, TransactionType},
        query::TransactionQuery,
        repository::{Summary, TransactionRepository},
        validation::{NewTransaction, TransactionUpdate},
    },
    user::UserID,
};

const TRANSACTION_NOT_FOUND: &str = "transaction not found";
const USER_NOT_FOUND: &str = "user not found";

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// The public view of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// The transaction's ID.
    pub id: String,
    /// Whether money came in or went out.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money.
    pub amount: f64,
    /// A short description.
    pub title: String,
    /// The category the transaction is filed under.
    pub category: Category,
    /// When the transaction happened, as `YYYY-MM-DD`.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id.to_string(),
            kind: transaction.kind,
            amount: transaction.amount,
            title: transaction.title.as_ref().to_owned(),
            category: transaction.category,
            date: transaction.date,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

/// The totals of a user's transactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryResponse {
    /// The sum of all income.
    pub income: f64,
    /// The sum of all expenses.
    pub expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
}

impl From<Summary> for SummaryResponse {
    fn from(summary: Summary) -> Self {
        Self {
            income: summary.total_income,
            expenses: summary.total_expense,
            balance: summary.balance,
        }
    }
}

/// Manages the transactions of the logged in user.
///
/// Every method takes the ID of the user making the request and only ever sees
/// that user's transactions.
#[derive(Debug, Clone)]
pub struct TransactionService<R> {
    repository: R,
}

impl<R> TransactionService<R>
where
    R: TransactionRepository,
{
    /// Create a service backed by `repository`.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Store a new transaction owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if `owner` no longer exists.
    pub fn create_transaction(
        &self,
        owner: UserID,
        data: NewTransaction,
    ) -> Result<TransactionResponse, Error> {
        let transaction = self.repository.create(owner, &data).map_err(|error| {
            // The owner's account was deleted after their token was issued.
            if error.is_foreign_key_violation() {
                Error::NotFound(USER_NOT_FOUND)
            } else {
                Error::Service(error)
            }
        })?;

        tracing::debug!("User {owner} created transaction {}", transaction.id);

        Ok(transaction.into())
    }

    /// Get a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
    pub fn get_transaction(
        &self,
        owner: UserID,
        id: TransactionId,
    ) -> Result<TransactionResponse, Error> {
        self.repository
            .get_by_id(owner, id)?
            .map(TransactionResponse::from)
            .ok_or(Error::NotFound(TRANSACTION_NOT_FOUND))
    }

    /// Get every transaction of `owner`, newest first.
    pub fn get_all(&self, owner: UserID) -> Result<Vec<TransactionResponse>, Error> {
        let transactions = self.repository.get_all(owner)?;

        Ok(transactions.into_iter().map(TransactionResponse::from).collect())
    }

    /// Get the transactions of `owner` that match `query`.
    pub fn get_all_by_filters(
        &self,
        owner: UserID,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionResponse>, Error> {
        let transactions = self.repository.get_by_filter(owner, query)?;

        Ok(transactions.into_iter().map(TransactionResponse::from).collect())
    }

    /// Apply the changes in `update`, keeping the other fields.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
    pub fn update_one(
        &self,
        owner: UserID,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<TransactionResponse, Error> {
        self.repository
            .update(owner, id, &update)?
            .map(TransactionResponse::from)
            .ok_or(Error::NotFound(TRANSACTION_NOT_FOUND))
    }

    /// Overwrite every field of a transaction.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
    pub fn replace_one(
        &self,
        owner: UserID,
        id: TransactionId,
        data: NewTransaction,
    ) -> Result<TransactionResponse, Error> {
        self.repository
            .replace(owner, id, &data)?
            .map(TransactionResponse::from)
            .ok_or(Error::NotFound(TRANSACTION_NOT_FOUND))
    }

    /// Delete a transaction and return it.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
    pub fn delete_one(
        &self,
        owner: UserID,
        id: TransactionId,
    ) -> Result<TransactionResponse, Error> {
        let transaction = self
            .repository
            .delete(owner, id)?
            .ok_or(Error::NotFound(TRANSACTION_NOT_FOUND))?;

        tracing::debug!("User {owner} deleted transaction {}", transaction.id);

        Ok(transaction.into())
    }

    /// Sum the income and expenses of `owner`. All zero if there are no transactions.
    pub fn get_financial_summary(&self, owner: UserID) -> Result<SummaryResponse, Error> {
        Ok(self.repository.get_summary(owner)?.into())
    }
}

#[cfg(test)]
mod transaction_service_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use time::macros::date;

    use crate::{
        Error, PasswordHash, StorageError,
        test_utils::get_test_connection,
        transaction::{
            core::{Category, Transaction, TransactionId, TransactionTitle, TransactionType},
            query::TransactionQuery,
            repository::{SQLiteTransactionRepository, Summary, TransactionRepository},
            validation::{NewTransaction, TransactionUpdate},
        },
        user::{SQLiteUserRepository, UserID, UserName, UserRepository},
    };

    use super::{SummaryResponse, TransactionService};

    fn get_service() -> (TransactionService<SQLiteTransactionRepository>, UserID) {
        let connection = get_test_connection();
        let user = SQLiteUserRepository::new(connection.clone())
            .create(
                &UserName::new_unchecked("Test User"),
                &EmailAddress::from_str("foo@bar.baz").unwrap(),
                &PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap();

        (
            TransactionService::new(SQLiteTransactionRepository::new(connection)),
            user.id,
        )
    }

    fn new_transaction(kind: TransactionType, amount: f64) -> NewTransaction {
        NewTransaction {
            kind,
            amount,
            title: TransactionTitle::new_unchecked("Test transaction"),
            category: Category::Other,
            date: date!(2024 - 03 - 15),
        }
    }

    #[test]
    fn create_then_get_round_trips_date() {
        let (service, owner) = get_service();

        let created = service
            .create_transaction(owner, new_transaction(TransactionType::Expense, 9.99))
            .unwrap();
        let id = TransactionId::from_str(&created.id).unwrap();

        let got = service.get_transaction(owner, id).unwrap();

        assert_eq!(got, created);
        assert_eq!(got.date, date!(2024 - 03 - 15));
    }

    #[test]
    fn create_for_missing_owner_is_not_found() {
        let (service, owner) = get_service();
        let missing_owner = UserID::new(owner.as_i64() + 1);

        let result =
            service.create_transaction(missing_owner, new_transaction(TransactionType::Income, 1.0));

        assert_eq!(result, Err(Error::NotFound("user not found")));
    }

    #[test]
    fn missing_transaction_is_not_found() {
        let (service, owner) = get_service();
        let id = TransactionId::new(1);
        let not_found = Err(Error::NotFound("transaction not found"));

        assert_eq!(service.get_transaction(owner, id), not_found);
        assert_eq!(
            service.update_one(
                owner,
                id,
                TransactionUpdate {
                    amount: Some(1.0),
                    ..Default::default()
                }
            ),
            not_found
        );
        assert_eq!(
            service.replace_one(owner, id, new_transaction(TransactionType::Income, 1.0)),
            not_found
        );
        assert_eq!(service.delete_one(owner, id), not_found);
    }

    #[test]
    fn delete_twice_is_not_found() {
        let (service, owner) = get_service();
        let created = service
            .create_transaction(owner, new_transaction(TransactionType::Income, 10.0))
            .unwrap();
        let id = TransactionId::from_str(&created.id).unwrap();

        assert_eq!(service.delete_one(owner, id), Ok(created));
        assert_eq!(
            service.delete_one(owner, id),
            Err(Error::NotFound("transaction not found"))
        );
    }

    #[test]
    fn list_is_empty_without_transactions() {
        let (service, owner) = get_service();

        assert_eq!(service.get_all(owner), Ok(vec![]));
        assert_eq!(
            service.get_all_by_filters(owner, &TransactionQuery::default()),
            Ok(vec![])
        );
    }

    #[test]
    fn summary_of_income_and_expenses() {
        let (service, owner) = get_service();
        for (kind, amount) in [
            (TransactionType::Income, 100.0),
            (TransactionType::Expense, 30.0),
            (TransactionType::Income, 50.0),
        ] {
            service
                .create_transaction(owner, new_transaction(kind, amount))
                .unwrap();
        }

        assert_eq!(
            service.get_financial_summary(owner),
            Ok(SummaryResponse {
                income: 150.0,
                expenses: 30.0,
                balance: 120.0,
            })
        );
    }

    #[test]
    fn summary_without_transactions_is_zero() {
        let (service, owner) = get_service();

        assert_eq!(
            service.get_financial_summary(owner),
            Ok(SummaryResponse {
                income: 0.0,
                expenses: 0.0,
                balance: 0.0,
            })
        );
    }

    /// A repository whose every operation fails, for checking error wrapping.
    struct BrokenRepository;

    impl TransactionRepository for BrokenRepository {
        fn create(&self, _: UserID, _: &NewTransaction) -> Result<Transaction, StorageError> {
            Err(StorageError::Lock)
        }

        fn get_by_id(
            &self,
            _: UserID,
            _: TransactionId,
        ) -> Result<Option<Transaction>, StorageError> {
            Err(StorageError::Lock)
        }

        fn get_all(&self, _: UserID) -> Result<Vec<Transaction>, StorageError> {
            Err(StorageError::Lock)
        }

        fn get_by_filter(
            &self,
            _: UserID,
            _: &TransactionQuery,
        ) -> Result<Vec<Transaction>, StorageError> {
            Err(StorageError::Lock)
        }

        fn update(
            &self,
            _: UserID,
            _: TransactionId,
            _: &TransactionUpdate,
        ) -> Result<Option<Transaction>, StorageError> {
            Err(StorageError::Lock)
        }

        fn replace(
            &self,
            _: UserID,
            _: TransactionId,
            _: &NewTransaction,
        ) -> Result<Option<Transaction>, StorageError> {
            Err(StorageError::Lock)
        }

        fn delete(
            &self,
            _: UserID,
            _: TransactionId,
        ) -> Result<Option<Transaction>, StorageError> {
            Err(StorageError::Lock)
        }

        fn get_summary(&self, _: UserID) -> Result<Summary, StorageError> {
            Err(StorageError::Lock)
        }
    }

    #[test]
    fn storage_errors_are_wrapped() {
        let service = TransactionService::new(BrokenRepository);
        let owner = UserID::new(1);
        let expected = Err(Error::Service(StorageError::Lock));

        assert_eq!(
            service.create_transaction(owner, new_transaction(TransactionType::Income, 1.0)),
            expected
        );
        assert_eq!(service.get_transaction(owner, TransactionId::new(1)), expected);
        assert_eq!(service.get_all(owner), Err(Error::Service(StorageError::Lock)));
        assert_eq!(
            service.get_financial_summary(owner),
            Err(Error::Service(StorageError::Lock))
        );
    }
}
