/// User directory core
///
/// Protocol-agnostic business operations shared by the REST and SOAP
/// adapters: list, search, get, create, update and delete. This module owns
/// the validation rules and the canonical error taxonomy. The adapters
/// translate [`DirectoryError`] into their own wire idiom (HTTP status
/// codes, SOAP fault codes) and never invent error categories of their own.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use userdir_shared::db::MemoryStore;
/// use userdir_shared::directory::Directory;
/// use userdir_shared::models::CreateUser;
///
/// # async fn example() -> Result<(), userdir_shared::directory::DirectoryError> {
/// let directory = Directory::new(Arc::new(MemoryStore::new()));
///
/// let user = directory
///     .create(CreateUser {
///         name: "Ann".to_string(),
///         email: "Ann@X.com".to_string(),
///         age: 30,
///         role: None,
///     })
///     .await?;
///
/// assert_eq!(user.email, "ann@x.com");
/// assert_eq!(directory.get(&user.id).await?.id, user.id);
/// # Ok(())
/// # }
/// ```

use crate::db::{StoreError, UserStore};
use crate::models::{CreateUser, UpdateUser, User, UserFields, UserRole};
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

/// Default page size for [`Directory::list`]
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Canonical error taxonomy for directory operations
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Malformed or missing input fields
    #[error("{0}")]
    Validation(String),

    /// No record for the given id
    #[error("User not found")]
    NotFound,

    /// Duplicate unique key
    #[error("{0}")]
    Conflict(String),

    /// The record store is unreachable or errored
    #[error("{0}")]
    Store(StoreError),
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(_) => {
                DirectoryError::Conflict("Email already exists".to_string())
            }
            failure => DirectoryError::Store(failure),
        }
    }
}

/// Directory result type alias
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// One page of users together with a result count
///
/// For [`Directory::list`], `total` counts the whole collection regardless
/// of the page requested; for [`Directory::search`] it equals the number of
/// users returned.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
}

/// Protocol-agnostic user directory
///
/// Cheap to clone; the store handle is shared behind an `Arc`.
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn UserStore>,
}

impl Directory {
    /// Creates a directory over the given store
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Reports whether the record store is currently reachable
    pub async fn ping(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    /// Lists one page of users in store order
    ///
    /// `page` and `limit` floor at 1 and default to 1 and
    /// [`DEFAULT_PAGE_SIZE`]. The returned `total` counts the whole
    /// collection irrespective of the window requested.
    ///
    /// No upper bound is applied to `limit` here: the SOAP entry path clamps
    /// it to 100 before calling, while the REST path passes it through
    /// unchanged. The asymmetry is deliberate and documented, not an
    /// accident to unify away.
    pub async fn list(&self, page: Option<i64>, limit: Option<i64>) -> DirectoryResult<UserPage> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let skip = (page - 1).saturating_mul(limit) as u64;

        let users = self.store.find_page(skip, limit).await?;
        let total = self.store.count().await?;

        Ok(UserPage { users, total })
    }

    /// Returns every user whose name or email contains `query` as a
    /// case-insensitive substring
    ///
    /// The empty query matches everything; results are unpaginated and
    /// `total` equals the number of matches.
    pub async fn search(&self, query: &str) -> DirectoryResult<UserPage> {
        let users = self.store.search(query).await?;
        let total = users.len() as u64;
        Ok(UserPage { users, total })
    }

    /// Fetches a user by id
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] if no record exists for `id` or `id` is
    /// not a validly formed identifier.
    pub async fn get(&self, id: &str) -> DirectoryResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::Validation`] when a required field is missing or
    ///   invalid
    /// - [`DirectoryError::Conflict`] when the email (case-insensitively)
    ///   already exists; decided by the store unique index, so two
    ///   concurrent creates with the same email cannot both succeed
    pub async fn create(&self, input: CreateUser) -> DirectoryResult<User> {
        let input = input.normalized();
        input
            .validate()
            .map_err(|errors| DirectoryError::Validation(validation_message(errors)))?;

        let fields = UserFields {
            name: input.name,
            email: input.email,
            age: input.age,
            role: input.role.unwrap_or_default(),
        };

        Ok(self.store.insert(fields).await?)
    }

    /// Applies a partial update to an existing user
    ///
    /// Merge semantics: fields absent from `patch` keep their stored value;
    /// fields present overwrite it; an explicit null clears the field, which
    /// for the required `name`/`email`/`age` fails the post-merge
    /// validation, and for `role` resets it to the default. The merged
    /// candidate is re-validated as a whole before anything is written.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::NotFound`] for an unknown or malformed id
    /// - [`DirectoryError::Validation`] when the merged record is invalid
    /// - [`DirectoryError::Conflict`] when the new email collides
    pub async fn update(&self, id: &str, patch: UpdateUser) -> DirectoryResult<User> {
        let current = self.get(id).await?;

        let candidate = CreateUser {
            name: merge_text(patch.name, current.name),
            email: merge_text(patch.email, current.email),
            age: match patch.age {
                None => current.age,
                Some(Some(age)) => age,
                // Cleared; fails the >= 1 validation below
                Some(None) => 0,
            },
            role: Some(match patch.role {
                None => current.role,
                Some(Some(role)) => role,
                Some(None) => UserRole::default(),
            }),
        }
        .normalized();

        candidate
            .validate()
            .map_err(|errors| DirectoryError::Validation(validation_message(errors)))?;

        let fields = UserFields {
            name: candidate.name,
            email: candidate.email,
            age: candidate.age,
            role: candidate.role.unwrap_or_default(),
        };

        self.store
            .update(id, fields)
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    /// Hard-deletes a user, returning the removed record
    ///
    /// Callers use the returned record's `name` in their acknowledgement
    /// messages.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] for an unknown or malformed id.
    pub async fn delete(&self, id: &str) -> DirectoryResult<User> {
        self.store
            .delete(id)
            .await?
            .ok_or(DirectoryError::NotFound)
    }
}

fn merge_text(patch: Option<Option<String>>, current: String) -> String {
    match patch {
        None => current,
        Some(Some(value)) => value,
        // Cleared; required text fields then fail post-merge validation
        Some(None) => String::new(),
    }
}

/// Flattens validator output into one deterministic human-readable message
fn validation_message(errors: validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();

    messages.sort();
    messages.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn directory() -> Directory {
        Directory::new(Arc::new(MemoryStore::new()))
    }

    fn ann() -> CreateUser {
        CreateUser {
            name: "Ann".to_string(),
            email: "Ann@X.com".to_string(),
            age: 30,
            role: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let directory = directory();

        let created = directory.create(ann()).await.unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.email, "ann@x.com");
        assert_eq!(created.role, UserRole::User);
        assert!(created.created_at.is_some());

        let fetched = directory.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_duplicate_email_conflicts() {
        let directory = directory();
        directory.create(ann()).await.unwrap();

        let mut second = ann();
        second.name = "Other Ann".to_string();
        second.email = "ANN@x.com".to_string();

        let err = directory.create(second).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_missing_fields_fails_validation() {
        let directory = directory();

        let err = directory
            .create(CreateUser {
                name: "  ".to_string(),
                email: "".to_string(),
                age: 0,
                role: None,
            })
            .await
            .unwrap_err();

        let DirectoryError::Validation(message) = err else {
            panic!("expected validation error");
        };
        assert!(message.contains("Name is required"));
        assert!(message.contains("Email is required"));
        assert!(message.contains("Age must be at least 1"));
    }

    #[tokio::test]
    async fn test_partial_update_preserves_unspecified_fields() {
        let directory = directory();
        let created = directory.create(ann()).await.unwrap();

        let patch: UpdateUser = serde_json::from_str(r#"{"role":"admin"}"#).unwrap();
        let updated = directory.update(&created.id, patch).await.unwrap();

        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.age, created.age);
    }

    #[tokio::test]
    async fn test_update_cannot_clear_required_field() {
        let directory = directory();
        let created = directory.create(ann()).await.unwrap();

        let patch: UpdateUser = serde_json::from_str(r#"{"name":null}"#).unwrap();
        let err = directory.update(&created.id, patch).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));

        // Nothing was written
        assert_eq!(directory.get(&created.id).await.unwrap().name, "Ann");
    }

    #[tokio::test]
    async fn test_update_null_role_resets_to_default() {
        let directory = directory();
        let created = directory.create(ann()).await.unwrap();

        let promote: UpdateUser = serde_json::from_str(r#"{"role":"moderator"}"#).unwrap();
        directory.update(&created.id, promote).await.unwrap();

        let reset: UpdateUser = serde_json::from_str(r#"{"role":null}"#).unwrap();
        let updated = directory.update(&created.id, reset).await.unwrap();
        assert_eq!(updated.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_update_unknown_id_not_found() {
        let directory = directory();

        let patch: UpdateUser = serde_json::from_str(r#"{"age":31}"#).unwrap();
        let err = directory.update("000", patch).await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_then_get_not_found() {
        let directory = directory();
        let created = directory.create(ann()).await.unwrap();

        let deleted = directory.delete(&created.id).await.unwrap();
        assert_eq!(deleted.name, "Ann");

        let err = directory.get(&created.id).await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound));
    }

    #[tokio::test]
    async fn test_list_totals_whole_collection() {
        let directory = directory();
        for i in 0..7 {
            directory
                .create(CreateUser {
                    name: format!("User {}", i),
                    email: format!("user{}@x.com", i),
                    age: 20 + i,
                    role: None,
                })
                .await
                .unwrap();
        }

        let page = directory.list(Some(2), Some(3)).await.unwrap();
        assert_eq!(page.users.len(), 3);
        assert_eq!(page.total, 7);

        // Defaults and floors
        let page = directory.list(None, None).await.unwrap();
        assert_eq!(page.users.len(), 7);

        let page = directory.list(Some(-5), Some(-5)).await.unwrap();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.total, 7);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_wildcard() {
        let directory = directory();
        directory.create(ann()).await.unwrap();
        directory
            .create(CreateUser {
                name: "Bob".to_string(),
                email: "bob@y.com".to_string(),
                age: 40,
                role: Some(UserRole::Moderator),
            })
            .await
            .unwrap();

        let all = directory.search("").await.unwrap();
        assert_eq!(all.total, 2);

        let hits = directory.search("aNn").await.unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.users[0].name, "Ann");

        let hits = directory.search("Y.COM").await.unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.users[0].name, "Bob");
    }
}
