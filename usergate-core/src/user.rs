//! User entity and insert input

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::ValidationError;

/// Maximum length for `name` and `last_name`
pub const MAX_NAME_LEN: usize = 255;

/// Accepted age range for new users
pub const MIN_AGE: i64 = 0;
pub const MAX_AGE: i64 = 150;

/// User record as read from storage.
///
/// `key` is only populated by the age listing, which projects it out of the
/// stored settings payload. Lookups by name leave it `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub from: Option<String>,
    pub age: i64,
    pub key: Option<Value>,
}

/// Input for a single insert: `{name, lastName, age}`.
///
/// Deserialized values are unchecked until [`NewUser::validate`] runs;
/// [`NewUser::new`] validates eagerly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub last_name: String,
    pub age: i64,
}

impl NewUser {
    /// Create validated insert input.
    ///
    /// # Rules
    /// - `name` and `last_name` non-empty after trimming, max 255 characters
    /// - `age` in `0..=150`
    ///
    /// # Example
    /// ```
    /// use usergate_core::NewUser;
    ///
    /// assert!(NewUser::new("Ada", "Lovelace", 36).is_ok());
    /// assert!(NewUser::new("", "Lovelace", 36).is_err());
    /// assert!(NewUser::new("Ada", "Lovelace", -1).is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        last_name: impl Into<String>,
        age: i64,
    ) -> Result<Self, ValidationError> {
        let user = Self {
            name: name.into(),
            last_name: last_name.into(),
            age,
        };
        user.validate()?;
        Ok(user)
    }

    /// Check field presence and ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_text("name", &self.name)?;
        check_text("last_name", &self.last_name)?;

        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(ValidationError::OutOfRange {
                field: "age",
                min: MIN_AGE,
                max: MAX_AGE,
                value: self.age,
            });
        }

        Ok(())
    }
}

fn check_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}
