//! Route handlers for the logged in user's transactions.

use std::str::FromStr;

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};

use crate::{
    AppState, Error,
    transaction::{
        core::TransactionId,
        query::TransactionQuery,
        repository::SQLiteTransactionRepository,
        service::{SummaryResponse, TransactionResponse, TransactionService},
        validation::{NewTransaction, TransactionUpdate},
    },
    user::UserID,
    validation::{ValidJson, ValidQuery},
};

/// The transaction service backed by SQLite that the route handlers use.
pub type SQLiteTransactionService = TransactionService<SQLiteTransactionRepository>;

impl FromRef<AppState> for SQLiteTransactionService {
    fn from_ref(state: &AppState) -> Self {
        TransactionService::new(SQLiteTransactionRepository::new(
            state.db_connection.clone(),
        ))
    }
}

/// A route handler for creating a new transaction, responds with the stored transaction.
///
/// The owner is always the logged in user, whatever the payload says.
pub async fn create_transaction_endpoint(
    State(service): State<SQLiteTransactionService>,
    Extension(user_id): Extension<UserID>,
    ValidJson(data): ValidJson<NewTransaction>,
) -> Result<(StatusCode, Json<TransactionResponse>), Error> {
    let transaction = service.create_transaction(user_id, data)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for listing transactions, optionally filtered, sorted and paginated.
pub async fn get_transactions_endpoint(
    State(service): State<SQLiteTransactionService>,
    Extension(user_id): Extension<UserID>,
    ValidQuery(query): ValidQuery<TransactionQuery>,
) -> Result<Json<Vec<TransactionResponse>>, Error> {
    if query == TransactionQuery::default() {
        return service.get_all(user_id).map(Json);
    }

    service.get_all_by_filters(user_id, &query).map(Json)
}

/// A route handler for the income, expense and balance totals of the logged in user.
pub async fn get_summary_endpoint(
    State(service): State<SQLiteTransactionService>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<SummaryResponse>, Error> {
    service.get_financial_summary(user_id).map(Json)
}

/// A route handler for getting a single transaction.
pub async fn get_transaction_endpoint(
    State(service): State<SQLiteTransactionService>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionResponse>, Error> {
    let id = TransactionId::from_str(&transaction_id)?;

    service.get_transaction(user_id, id).map(Json)
}

/// A route handler for changing some of the fields of a transaction.
pub async fn update_transaction_endpoint(
    State(service): State<SQLiteTransactionService>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
    ValidJson(update): ValidJson<TransactionUpdate>,
) -> Result<Json<TransactionResponse>, Error> {
    let id = TransactionId::from_str(&transaction_id)?;

    service.update_one(user_id, id, update).map(Json)
}

/// A route handler for overwriting every field of a transaction.
pub async fn replace_transaction_endpoint(
    State(service): State<SQLiteTransactionService>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
    ValidJson(data): ValidJson<NewTransaction>,
) -> Result<Json<TransactionResponse>, Error> {
    let id = TransactionId::from_str(&transaction_id)?;

    service.replace_one(user_id, id, data).map(Json)
}

/// A route handler for deleting a transaction, responds with the deleted transaction.
pub async fn delete_transaction_endpoint(
    State(service): State<SQLiteTransactionService>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionResponse>, Error> {
    let id = TransactionId::from_str(&transaction_id)?;

    service.delete_one(user_id, id).map(Json)
}
