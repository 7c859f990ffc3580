/// MongoDB record store
///
/// This module provides the production [`UserStore`] implementation backed
/// by a `users` collection. [`MongoStore::connect`] bootstraps the client,
/// verifies connectivity with a ping and creates the unique email index;
/// a dead store at startup is an error, never a degraded boot.
///
/// # Persisted layout
///
/// ```text
/// users: {
///     _id:       ObjectId,
///     name:      String,
///     email:     String,   // lower-cased; unique index
///     age:       Int64,
///     role:      String,   // "user" | "admin" | "moderator"
///     createdAt: DateTime,
///     updatedAt: DateTime
/// }
/// ```
///
/// # Example
///
/// ```no_run
/// use userdir_shared::db::{MongoStore, UserStore};
///
/// # async fn example() -> Result<(), userdir_shared::db::StoreError> {
/// let store = MongoStore::connect("mongodb://localhost:27017", "userdir").await?;
/// let total = store.count().await?;
/// println!("{} users", total);
/// # Ok(())
/// # }
/// ```

use super::{StoreError, StoreResult, UserStore};
use crate::models::{User, UserFields, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

const USERS_COLLECTION: &str = "users";

/// Storage shape of a user record; never leaves this module
#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    age: i64,
    #[serde(default)]
    role: UserRole,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    created_at: Option<BsonDateTime>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    updated_at: Option<BsonDateTime>,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        User {
            id: doc.id.to_hex(),
            name: doc.name,
            email: doc.email,
            age: doc.age,
            role: doc.role,
            created_at: doc.created_at.and_then(to_chrono),
            updated_at: doc.updated_at.and_then(to_chrono),
        }
    }
}

fn to_chrono(ts: BsonDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts.timestamp_millis())
}

/// MongoDB-backed user store
///
/// The wrapped client is internally pooled; clone freely and share across
/// request handlers without locking.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connects to MongoDB, pings it and ensures the unique email index
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is invalid, the server is unreachable or
    /// index creation fails. Callers at process start should treat this as
    /// fatal: the service must not accept traffic claiming a working store.
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let store = Self {
            db: client.database(database),
        };

        store.ping().await?;
        store.ensure_indexes().await?;

        info!(database, "MongoDB connection established");
        Ok(store)
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.collection(USERS_COLLECTION)
    }

    /// Creates the unique index on `email`
    ///
    /// Uniqueness of concurrent writers is decided here by the server, not
    /// by application-side existence checks.
    async fn ensure_indexes(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.users().create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn find_page(&self, skip: u64, limit: i64) -> StoreResult<Vec<User>> {
        let documents: Vec<UserDocument> = self
            .users()
            .find(doc! {})
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok(documents.into_iter().map(User::from).collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.users().count_documents(doc! {}).await?)
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<User>> {
        let filter = doc! {
            "$or": [
                { "name": { "$regex": query, "$options": "i" } },
                { "email": { "$regex": query, "$options": "i" } },
            ]
        };

        let documents: Vec<UserDocument> =
            self.users().find(filter).await?.try_collect().await?;

        Ok(documents.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        Ok(self
            .users()
            .find_one(doc! { "_id": oid })
            .await?
            .map(User::from))
    }

    async fn insert(&self, fields: UserFields) -> StoreResult<User> {
        let now = BsonDateTime::from_millis(Utc::now().timestamp_millis());
        let document = UserDocument {
            id: ObjectId::new(),
            name: fields.name,
            email: fields.email,
            age: fields.age,
            role: fields.role,
            created_at: Some(now),
            updated_at: Some(now),
        };

        self.users().insert_one(&document).await?;
        Ok(User::from(document))
    }

    async fn update(&self, id: &str, fields: UserFields) -> StoreResult<Option<User>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let update = doc! {
            "$set": {
                "name": fields.name,
                "email": fields.email,
                "age": fields.age,
                "role": fields.role.to_string(),
                "updatedAt": BsonDateTime::from_millis(Utc::now().timestamp_millis()),
            }
        };

        let updated = self
            .users()
            .find_one_and_update(doc! { "_id": oid }, update)
            .return_document(ReturnDocument::After)
            .await?;

        Ok(updated.map(User::from))
    }

    async fn delete(&self, id: &str) -> StoreResult<Option<User>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        Ok(self
            .users()
            .find_one_and_delete(doc! { "_id": oid })
            .await?
            .map(User::from))
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            StoreError::DuplicateKey(err.to_string())
        } else {
            StoreError::Failure(err.to_string())
        }
    }
}

/// Detects the server's E11000 unique-index violation in either of the
/// shapes the driver surfaces it (plain writes vs. findAndModify)
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write)) => write.code == 11000,
        ErrorKind::Command(ref command) => command.code == 11000,
        _ => false,
    }
}
