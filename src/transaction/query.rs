//! The filters, sorting and pagination accepted when listing transactions.

use serde::Deserialize;
use time::Date;

use crate::{
    transaction::{
        core::{Category, TransactionType},
        validation::parse_date_str,
    },
    validation::{Validate, ValidationErrors},
};

/// The largest page size a client may ask for.
pub const MAX_PAGE_SIZE: u64 = 100;

/// The field to sort transactions by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    /// The date the transaction happened.
    #[default]
    Date,
    /// The amount of money.
    Amount,
    /// The title, in lexicographic order.
    Title,
    /// The time the transaction was recorded.
    CreatedAt,
}

impl SortField {
    /// The column this field is stored in.
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Amount => "amount",
            SortField::Title => "title",
            SortField::CreatedAt => "created_at",
        }
    }
}

/// The order to sort transactions in a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    #[default]
    Descending,
}

impl SortOrder {
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// The query string of the transaction list endpoint, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    category: Option<String>,
    min_amount: Option<String>,
    max_amount: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    page: Option<String>,
    limit: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

/// Defines how transactions should be fetched from a [TransactionRepository](crate::transaction::repository::TransactionRepository).
///
/// Filters that are `None` match every transaction. Set filters are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    /// Only include transactions of this type.
    pub kind: Option<TransactionType>,
    /// Only include transactions in this category.
    pub category: Option<Category>,
    /// Only include transactions with an amount of at least this much.
    pub min_amount: Option<f64>,
    /// Only include transactions with an amount of at most this much.
    pub max_amount: Option<f64>,
    /// Only include transactions on or after this date.
    pub start_date: Option<Date>,
    /// Only include transactions on or before this date.
    pub end_date: Option<Date>,
    /// The field to sort by. Ties are broken by ID in the same order.
    pub sort_by: SortField,
    /// The direction to sort in.
    pub sort_order: SortOrder,
    /// The page to return, starting from 1. Ignored without a `limit`.
    pub page: u64,
    /// The maximum number of transactions to return.
    pub limit: Option<u64>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            kind: None,
            category: None,
            min_amount: None,
            max_amount: None,
            start_date: None,
            end_date: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: None,
        }
    }
}

impl TransactionQuery {
    /// Parse and check the query string of the transaction list endpoint.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid parameter, named after the parameter.
    pub fn parse(raw: RawTransactionQuery) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let kind = errors.check_present("type", raw.kind, |kind| {
            kind.parse::<TransactionType>()
                .map_err(|_| "type must be \"income\" or \"expense\"".to_owned())
        });
        let category = errors.check_present("category", raw.category, |category| {
            category
                .parse::<Category>()
                .map_err(|_| "category must be one of the available options".to_owned())
        });
        let min_amount = errors.check_present("minAmount", raw.min_amount, |amount| {
            parse_amount_bound("minAmount", amount)
        });
        let max_amount = errors.check_present("maxAmount", raw.max_amount, |amount| {
            parse_amount_bound("maxAmount", amount)
        });
        let start_date = errors.check_present("startDate", raw.start_date, parse_date_str);
        let end_date = errors.check_present("endDate", raw.end_date, parse_date_str);
        let page = errors.check_present("page", raw.page, |page| match page.parse::<u64>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err("page must be a positive integer".to_owned()),
        });
        let limit = errors.check_present("limit", raw.limit, |limit| match limit.parse::<u64>() {
            Ok(limit) if (1..=MAX_PAGE_SIZE).contains(&limit) => Ok(limit),
            _ => Err(format!(
                "limit must be an integer between 1 and {MAX_PAGE_SIZE}"
            )),
        });
        let sort_by = errors.check_present("sortBy", raw.sort_by, |field| match field {
            "date" => Ok(SortField::Date),
            "amount" => Ok(SortField::Amount),
            "title" => Ok(SortField::Title),
            "createdAt" => Ok(SortField::CreatedAt),
            _ => Err("sortBy must be one of date, amount, title or createdAt".to_owned()),
        });
        let sort_order = errors.check_present("sortOrder", raw.sort_order, |order| match order {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err("sortOrder must be \"asc\" or \"desc\"".to_owned()),
        });

        if let (Some(min), Some(max)) = (min_amount, max_amount) {
            if min > max {
                errors.add("minAmount", "minAmount must not be greater than maxAmount");
            }
        }

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                errors.add("startDate", "startDate must not be after endDate");
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            kind,
            category,
            min_amount,
            max_amount,
            start_date,
            end_date,
            sort_by: sort_by.unwrap_or_default(),
            sort_order: sort_order.unwrap_or_default(),
            page: page.unwrap_or(1),
            limit,
        })
    }

    /// The number of transactions to skip to reach the requested page.
    pub fn offset(&self) -> u64 {
        match self.limit {
            Some(limit) => self.page.saturating_sub(1).saturating_mul(limit),
            None => 0,
        }
    }
}

impl Validate for TransactionQuery {
    type Raw = RawTransactionQuery;

    fn validate(raw: RawTransactionQuery) -> Result<Self, ValidationErrors> {
        Self::parse(raw)
    }
}

fn parse_amount_bound(parameter: &str, text: &str) -> Result<f64, String> {
    match text.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        Ok(_) => Err(format!("{parameter} must not be negative")),
        Err(_) => Err(format!("{parameter} must be a number")),
    }
}
