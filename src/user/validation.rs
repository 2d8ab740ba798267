//! Validation rules for the user payloads.

use std::str::FromStr;

use email_address::EmailAddress;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    ValidatedPassword,
    user::core::UserName,
    validation::{Validate, ValidationErrors, as_trimmed_string, required},
};

/// Parse an email address, trimmed and in lower case.
pub(crate) fn parse_email(value: Value) -> Result<EmailAddress, String> {
    let email = as_trimmed_string("email", &value)?.to_lowercase();

    EmailAddress::from_str(&email).map_err(|_| "email must be a valid email address".to_owned())
}

/// Parse a password that satisfies the length rule.
pub(crate) fn parse_password(value: Value) -> Result<ValidatedPassword, String> {
    match value {
        Value::String(password) => ValidatedPassword::new(&password),
        _ => Err("password must be a string".to_owned()),
    }
}

fn parse_name(value: Value) -> Result<UserName, String> {
    UserName::new(&as_trimmed_string("name", &value)?)
}

/// The user payload as sent by the client, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct RawUser {
    name: Option<Value>,
    email: Option<Value>,
    password: Option<Value>,
}

/// The details needed to register a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The name to display for the user.
    pub name: UserName,
    /// The email address to log in with.
    pub email: EmailAddress,
    /// The password to log in with.
    pub password: ValidatedPassword,
}

impl Validate for NewUser {
    type Raw = RawUser;

    fn validate(raw: RawUser) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = errors.check("name", required("name", raw.name).and_then(parse_name));
        let email = errors.check("email", required("email", raw.email).and_then(parse_email));
        let password = errors.check(
            "password",
            required("password", raw.password).and_then(parse_password),
        );

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) => Ok(Self {
                name,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

/// Changes to a user's profile. At least one field is set.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUpdate {
    /// The new display name.
    pub name: Option<UserName>,
    /// The new email address.
    pub email: Option<EmailAddress>,
    /// The new password.
    pub password: Option<ValidatedPassword>,
}

impl Validate for UserUpdate {
    type Raw = RawUser;

    fn validate(raw: RawUser) -> Result<Self, ValidationErrors> {
        if raw.name.is_none() && raw.email.is_none() && raw.password.is_none() {
            return Err(ValidationErrors::single(
                "",
                "at least one field must be supplied for an update",
            ));
        }

        let mut errors = ValidationErrors::default();

        let name = errors.check_optional("name", raw.name, parse_name);
        let email = errors.check_optional("email", raw.email, parse_email);
        let password = errors.check_optional("password", raw.password, parse_password);

        if errors.is_empty() {
            Ok(Self {
                name,
                email,
                password,
            })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod user_validation_tests {
    use serde_json::json;

    use crate::validation::Validate;

    use super::{NewUser, RawUser, UserUpdate};

    fn raw(value: serde_json::Value) -> RawUser {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn new_user_normalizes_email() {
        let user = NewUser::validate(raw(json!({
            "name": " Ada Lovelace ",
            "email": " Ada@Example.COM ",
            "password": "hunter22",
        })))
        .unwrap();

        assert_eq!(user.name.as_ref(), "Ada Lovelace");
        assert_eq!(user.email.as_str(), "ada@example.com");
    }

    #[test]
    fn new_user_reports_every_field() {
        let errors = NewUser::validate(raw(json!({
            "name": "Ada",
            "email": "not an email",
            "password": "123",
        })))
        .unwrap_err();

        let paths: Vec<&str> = errors.errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["name", "email", "password"]);
    }

    #[test]
    fn new_user_requires_all_fields() {
        let errors = NewUser::validate(raw(json!({}))).unwrap_err();

        let messages: Vec<&str> = errors
            .errors()
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(
            messages,
            ["name is required", "email is required", "password is required"]
        );
    }

    #[test]
    fn update_requires_a_field() {
        let errors = UserUpdate::validate(raw(json!({"id": 3}))).unwrap_err();

        assert_eq!(errors.errors().len(), 1);
        assert_eq!(
            errors.errors()[0].message,
            "at least one field must be supplied for an update"
        );
    }

    #[test]
    fn update_validates_present_fields_only() {
        let update = UserUpdate::validate(raw(json!({"email": "NEW@example.com"}))).unwrap();

        assert_eq!(update.name, None);
        assert_eq!(update.email.unwrap().as_str(), "new@example.com");
        assert_eq!(update.password, None);
    }
}
