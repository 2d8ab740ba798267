//! Request validation shared by the user and transaction endpoints.
//!
//! Payloads are first deserialized into a loosely typed "raw" struct so that a
//! wrong type in one field does not hide the problems in the other fields.
//! [Validate::validate] then checks every rule and collects one [FieldError]
//! per violation, in the order the fields are checked.

use std::fmt::Display;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use crate::Error;

/// A broken validation rule and the field it applies to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// The name of the offending field, or an empty string for whole-payload errors.
    pub path: String,
    /// A human readable description of the rule that was broken.
    pub message: String,
}

/// The list of rules a payload broke.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Create a list holding a single error.
    pub fn single(path: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(path, message);
        errors
    }

    /// Record a broken rule for the field at `path`.
    pub fn add(&mut self, path: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            path: path.to_owned(),
            message: message.into(),
        });
    }

    /// Record the error in `result`, if any, and return the valid value otherwise.
    pub fn check<T>(&mut self, path: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(path, message);
                None
            }
        }
    }

    /// Like [ValidationErrors::check] for fields that may be left out.
    pub fn check_optional<T>(
        &mut self,
        path: &str,
        value: Option<Value>,
        parse: impl FnOnce(Value) -> Result<T, String>,
    ) -> Option<T> {
        value.and_then(|value| self.check(path, parse(value)))
    }

    /// Like [ValidationErrors::check_optional] for query parameters, where an
    /// empty value counts as left out.
    pub fn check_present<T>(
        &mut self,
        path: &str,
        value: Option<String>,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> Option<T> {
        let value = value.filter(|value| !value.trim().is_empty())?;

        self.check(path, parse(value.trim()))
    }

    /// Whether no rules were broken.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The broken rules in the order they were recorded.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.path, error.message))
            .collect();

        write!(f, "{}", messages.join("; "))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

/// A type that can be built from an untrusted payload after checking its rules.
pub trait Validate: Sized {
    /// The loosely typed shape the payload is deserialized into.
    type Raw: DeserializeOwned + Send;

    /// Check every rule and build the validated value.
    ///
    /// # Errors
    ///
    /// Returns every broken rule if any rule is broken.
    fn validate(raw: Self::Raw) -> Result<Self, ValidationErrors>;
}

/// An extractor that parses a JSON body and validates it before the handler runs.
///
/// **Note**: Route handlers can use the function argument `ValidJson(payload): ValidJson<T>`.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<T::Raw>::from_request(request, state)
            .await
            .map_err(|rejection| Error::MalformedBody(rejection.body_text()))?;

        T::validate(raw).map(ValidJson).map_err(Error::Validation)
    }
}

/// An extractor that parses the query string and validates it before the handler runs.
///
/// A query string that cannot be parsed at all is reported as [Error::MalformedBody].
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<T::Raw>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::MalformedBody(rejection.body_text()))?;

        T::validate(raw).map(ValidQuery).map_err(Error::Validation)
    }
}

/// The message for a required field that was left out.
pub(crate) fn required<T>(field: &str, value: Option<T>) -> Result<T, String> {
    value.ok_or_else(|| format!("{field} is required"))
}

/// Get the string in `value`, trimmed.
pub(crate) fn as_trimmed_string(field: &str, value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(|text| text.trim().to_owned())
        .ok_or_else(|| format!("{field} must be a string"))
}

/// Check that `text` has between `min` and `max` characters, inclusive.
///
/// Characters are counted as extended grapheme clusters so that accented
/// letters and emoji count as one character each.
pub(crate) fn check_length(field: &str, text: &str, min: usize, max: usize) -> Result<(), String> {
    let length = text.graphemes(true).count();

    if length < min {
        Err(format!("{field} must be at least {min} characters"))
    } else if length > max {
        Err(format!("{field} must be at most {max} characters"))
    } else {
        Ok(())
    }
}
