//! Validation rules for the transaction payloads.

use serde::Deserialize;
use serde_json::Value;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::{
    transaction::core::{Category, TransactionTitle, TransactionType},
    validation::{Validate, ValidationErrors, as_trimmed_string, required},
};

fn parse_type(value: Value) -> Result<TransactionType, String> {
    value
        .as_str()
        .and_then(|kind| kind.parse().ok())
        .ok_or_else(|| "type must be \"income\" or \"expense\"".to_owned())
}

/// The largest amount a single transaction may hold.
///
/// Keeps the sums in a summary finite.
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

fn parse_amount(value: Value) -> Result<f64, String> {
    let amount = value
        .as_f64()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| "amount must be a number".to_owned())?;

    if amount <= 0.0 {
        return Err("amount must be positive".to_owned());
    }

    if amount > MAX_AMOUNT {
        return Err(format!("amount must be at most {MAX_AMOUNT}"));
    }

    Ok(amount)
}

fn parse_title(value: Value) -> Result<TransactionTitle, String> {
    TransactionTitle::new(&as_trimmed_string("title", &value)?)
}

fn parse_category(value: Value) -> Result<Category, String> {
    value
        .as_str()
        .and_then(|category| category.parse().ok())
        .ok_or_else(|| "category is required and must be one of the available options".to_owned())
}

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 date-time.
///
/// Only the date part of a date-time is kept.
pub(crate) fn parse_date_str(text: &str) -> Result<Date, String> {
    let text = text.trim();

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .or_else(|_| OffsetDateTime::parse(text, &Rfc3339).map(|date_time| date_time.date()))
        .map_err(|_| "invalid date".to_owned())
}

fn parse_date(value: Value) -> Result<Date, String> {
    value
        .as_str()
        .ok_or_else(|| "invalid date".to_owned())
        .and_then(parse_date_str)
}

/// The transaction payload as sent by the client, before validation.
///
/// Fields the API does not know about, such as an owner ID, are dropped here.
#[derive(Debug, Default, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "type")]
    kind: Option<Value>,
    amount: Option<Value>,
    title: Option<Value>,
    category: Option<Value>,
    date: Option<Value>,
}

/// The details of a new transaction, or of a transaction to fully replace.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
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
}

impl Validate for NewTransaction {
    type Raw = RawTransaction;

    fn validate(raw: RawTransaction) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let kind = errors.check("type", required("type", raw.kind).and_then(parse_type));
        let amount = errors.check("amount", required("amount", raw.amount).and_then(parse_amount));
        let title = errors.check("title", required("title", raw.title).and_then(parse_title));
        let category = errors.check(
            "category",
            required("category", raw.category).and_then(parse_category),
        );
        let date = errors.check("date", required("date", raw.date).and_then(parse_date));

        match (kind, amount, title, category, date) {
            (Some(kind), Some(amount), Some(title), Some(category), Some(date)) => Ok(Self {
                kind,
                amount,
                title,
                category,
                date,
            }),
            _ => Err(errors),
        }
    }
}

/// Changes to a transaction. At least one field is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    /// The new type.
    pub kind: Option<TransactionType>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new title.
    pub title: Option<TransactionTitle>,
    /// The new category.
    pub category: Option<Category>,
    /// The new date.
    pub date: Option<Date>,
}

impl Validate for TransactionUpdate {
    type Raw = RawTransaction;

    fn validate(raw: RawTransaction) -> Result<Self, ValidationErrors> {
        if raw.kind.is_none()
            && raw.amount.is_none()
            && raw.title.is_none()
            && raw.category.is_none()
            && raw.date.is_none()
        {
            return Err(ValidationErrors::single(
                "",
                "at least one field must be supplied for an update",
            ));
        }

        let mut errors = ValidationErrors::default();

        let kind = errors.check_optional("type", raw.kind, parse_type);
        let amount = errors.check_optional("amount", raw.amount, parse_amount);
        let title = errors.check_optional("title", raw.title, parse_title);
        let category = errors.check_optional("category", raw.category, parse_category);
        let date = errors.check_optional("date", raw.date, parse_date);

        if errors.is_empty() {
            Ok(Self {
                kind,
                amount,
                title,
                category,
                date,
            })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod transaction_validation_tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        transaction::core::{Category, TransactionType},
        validation::Validate,
    };

    use super::{MAX_AMOUNT, NewTransaction, RawTransaction, TransactionUpdate, parse_date_str};

    fn raw(value: serde_json::Value) -> RawTransaction {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn valid_transaction_ignores_owner_fields() {
        let transaction = NewTransaction::validate(raw(json!({
            "type": "expense",
            "amount": 12.5,
            "title": "  Groceries  ",
            "category": "Food",
            "date": "2024-03-15",
            "ownerId": 999,
            "userId": 999,
        })))
        .unwrap();

        assert_eq!(transaction.kind, TransactionType::Expense);
        assert_eq!(transaction.amount, 12.5);
        assert_eq!(transaction.title.as_ref(), "Groceries");
        assert_eq!(transaction.category, Category::Food);
        assert_eq!(transaction.date, date!(2024 - 03 - 15));
    }

    #[test]
    fn errors_follow_field_order() {
        let errors = NewTransaction::validate(raw(json!({
            "type": "transfer",
            "amount": -1,
            "title": "abc",
            "category": "Gambling",
            "date": "yesterday",
        })))
        .unwrap_err();

        let found: Vec<(&str, &str)> = errors
            .errors()
            .iter()
            .map(|e| (e.path.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            found,
            [
                ("type", "type must be \"income\" or \"expense\""),
                ("amount", "amount must be positive"),
                ("title", "title must be at least 5 characters"),
                (
                    "category",
                    "category is required and must be one of the available options"
                ),
                ("date", "invalid date"),
            ]
        );
    }

    #[test]
    fn amount_must_be_a_number() {
        let errors = NewTransaction::validate(raw(json!({
            "type": "income",
            "amount": "100",
            "title": "Paycheck",
            "category": "Salary",
            "date": "2024-03-15",
        })))
        .unwrap_err();

        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].message, "amount must be a number");
    }

    #[test]
    fn zero_amount_is_rejected() {
        let errors = NewTransaction::validate(raw(json!({
            "type": "income",
            "amount": 0,
            "title": "Paycheck",
            "category": "Salary",
            "date": "2024-03-15",
        })))
        .unwrap_err();

        assert_eq!(errors.errors()[0].message, "amount must be positive");
    }

    #[test]
    fn huge_amount_is_rejected() {
        let errors = NewTransaction::validate(raw(json!({
            "type": "income",
            "amount": 1.0e300,
            "title": "Paycheck",
            "category": "Salary",
            "date": "2024-03-15",
        })))
        .unwrap_err();

        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].path, "amount");
        assert_eq!(
            errors.errors()[0].message,
            "amount must be at most 1000000000000"
        );

        let errors = TransactionUpdate::validate(raw(json!({"amount": 1.0e300}))).unwrap_err();
        assert_eq!(errors.errors()[0].path, "amount");
    }

    #[test]
    fn largest_amount_is_accepted() {
        let transaction = NewTransaction::validate(raw(json!({
            "type": "income",
            "amount": MAX_AMOUNT,
            "title": "Paycheck",
            "category": "Salary",
            "date": "2024-03-15",
        })))
        .unwrap();

        assert_eq!(transaction.amount, MAX_AMOUNT);
    }

    #[test]
    fn missing_fields_are_required() {
        let errors = NewTransaction::validate(raw(json!({"title": "Paycheck"}))).unwrap_err();

        let messages: Vec<&str> = errors
            .errors()
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(
            messages,
            [
                "type is required",
                "amount is required",
                "category is required",
                "date is required"
            ]
        );
    }

    #[test]
    fn accepts_rfc3339_dates() {
        assert_eq!(
            parse_date_str("2024-03-15T23:30:00Z"),
            Ok(date!(2024 - 03 - 15))
        );
        assert_eq!(
            parse_date_str("2024-03-15T10:00:00+02:00"),
            Ok(date!(2024 - 03 - 15))
        );
        assert_eq!(parse_date_str("2024-02-30"), Err("invalid date".to_owned()));
    }

    #[test]
    fn empty_update_is_rejected() {
        let errors = TransactionUpdate::validate(raw(json!({"ownerId": 2}))).unwrap_err();

        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].path, "");
        assert_eq!(
            errors.errors()[0].message,
            "at least one field must be supplied for an update"
        );
    }

    #[test]
    fn update_checks_present_fields() {
        let update = TransactionUpdate::validate(raw(json!({"amount": 42}))).unwrap();
        assert_eq!(
            update,
            TransactionUpdate {
                amount: Some(42.0),
                ..Default::default()
            }
        );

        let errors = TransactionUpdate::validate(raw(json!({"category": "food"}))).unwrap_err();
        assert_eq!(errors.errors()[0].path, "category");
    }
}
