/// Record store access layer
///
/// This module defines the contract between the directory core and the
/// persistent record store, plus the two implementations:
///
/// - `mongo`: production MongoDB store (unique email index, regex search)
/// - `memory`: in-memory store mirroring the same contract for tests
///
/// The core only ever talks to `dyn UserStore`, so nothing above this
/// module knows which implementation is running.

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::models::{User, UserFields};
use async_trait::async_trait;
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-key violation (a second record with the same email)
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The store is unreachable or the operation failed
    #[error("store failure: {0}")]
    Failure(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Contract between the directory core and the record store
///
/// Implementations must uphold:
/// - ids are opaque strings assigned at insert and never reused;
/// - a malformed id is indistinguishable from an unknown one (`Ok(None)`);
/// - the store enforces case-insensitive email uniqueness and rejects the
///   second writer with [`StoreError::DuplicateKey`]; callers do not
///   pre-check, so concurrent duplicate inserts race safely;
/// - `insert` assigns both timestamps, `update` refreshes `updated_at`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Verifies the store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Returns one page of users in store-defined order
    async fn find_page(&self, skip: u64, limit: i64) -> StoreResult<Vec<User>>;

    /// Counts every user in the collection
    async fn count(&self) -> StoreResult<u64>;

    /// Returns all users whose name or email matches `query`
    /// case-insensitively; the empty query matches everything
    async fn search(&self, query: &str) -> StoreResult<Vec<User>>;

    /// Looks up a user by id
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    /// Inserts a new record, assigning id and timestamps
    async fn insert(&self, fields: UserFields) -> StoreResult<User>;

    /// Overwrites the mutable fields of an existing record and refreshes
    /// `updated_at`, returning the updated record (`None` if the id is
    /// unknown)
    async fn update(&self, id: &str, fields: UserFields) -> StoreResult<Option<User>>;

    /// Removes a record, returning it (`None` if the id is unknown)
    async fn delete(&self, id: &str) -> StoreResult<Option<User>>;
}
