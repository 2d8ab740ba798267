//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the types its fields are made of
//! - Validation of the create, update and list payloads
//! - The repository that stores transactions and the service built on top of it
//! - The route handlers for the transaction endpoints

mod core;
mod endpoints;
mod query;
mod repository;
mod service;
mod validation;

pub use self::core::{Category, TransactionId, TransactionType, create_transaction_table};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_summary_endpoint,
    get_transaction_endpoint, get_transactions_endpoint, replace_transaction_endpoint,
    update_transaction_endpoint,
};
