/// User model and input shapes
///
/// This module provides the canonical `User` record used by the directory
/// core and both wire adapters, plus the `CreateUser`/`UpdateUser` inputs.
/// The storage shape (BSON document with an ObjectId `_id`) lives in the
/// store layer and never leaks out of it; here ids are opaque strings and
/// timestamps are `chrono` UTC datetimes.
///
/// # Example
///
/// ```
/// use userdir_shared::models::CreateUser;
/// use validator::Validate;
///
/// let input = CreateUser {
///     name: "  Ann  ".to_string(),
///     email: "Ann@Example.com".to_string(),
///     age: 30,
///     role: None,
/// }
/// .normalized();
///
/// assert!(input.validate().is_ok());
/// assert_eq!(input.name, "Ann");
/// assert_eq!(input.email, "ann@example.com");
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Role assigned to a user account
///
/// Closed enumeration; wire values are the lowercase names. Invalid values
/// are rejected at the boundary, never coerced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account (the default)
    #[default]
    User,

    /// Full administrative access
    Admin,

    /// Elevated but non-administrative access
    Moderator,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::Moderator => write!(f, "moderator"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            "moderator" => Ok(UserRole::Moderator),
            other => Err(format!(
                "Role must be one of user, admin, moderator (got \"{}\")",
                other
            )),
        }
    }
}

/// Canonical user record
///
/// The `id` is assigned by the store at creation and never changes; it is
/// the sole handle for Get/Update/Delete across both protocols. Timestamps
/// are store-assigned: `created_at` once at creation, `updated_at` on every
/// mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque unique identifier (hex form of the store key)
    pub id: String,

    /// Display name, non-empty
    pub name: String,

    /// Lower-cased email, case-insensitively unique across all users
    pub email: String,

    /// Age in years, always >= 1
    pub age: i64,

    /// Account role
    pub role: UserRole,

    /// When the record was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the record was last mutated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
///
/// `name`, `email` and `age` are required; `role` defaults to
/// [`UserRole::User`] when absent. Call [`CreateUser::normalized`] before
/// validating so that whitespace-only names fail and emails land in the
/// store lower-cased.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    /// Display name
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    /// Email address (stored lower-cased, unique)
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Age in years
    #[validate(range(min = 1, message = "Age must be at least 1"))]
    pub age: i64,

    /// Optional role, defaulted when absent
    pub role: Option<UserRole>,
}

impl CreateUser {
    /// Trims whitespace and lower-cases the email ahead of validation
    ///
    /// The store's unique index is on the lower-cased email value, so the
    /// normalization must happen before the uniqueness check can mean
    /// anything.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self
    }
}

/// Partial update payload
///
/// Every field is optional, and "absent" is distinguished from "explicitly
/// null": `None` leaves the stored value untouched, `Some(None)` clears it.
/// Clearing `name`/`email`/`age` fails post-merge validation (they are
/// required); clearing `role` resets it to the default role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    /// New display name
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,

    /// New email address
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,

    /// New age
    #[serde(default, deserialize_with = "double_option")]
    pub age: Option<Option<i64>>,

    /// New role (explicit null resets to the default role)
    #[serde(default, deserialize_with = "double_option")]
    pub role: Option<Option<UserRole>>,
}

/// Validated field set written to the store
///
/// Produced by the directory core after validation and (for updates) the
/// partial merge; the store assigns id and timestamps around it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
    pub age: i64,
    pub role: UserRole,
}

/// Deserializes a field so that a missing key, an explicit null and a value
/// come out as `None`, `Some(None)` and `Some(Some(v))` respectively
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
