/// In-memory record store
///
/// Test double for [`UserStore`] mirroring the MongoDB contract: opaque hex
/// ids, case-insensitive unique emails, substring search, insertion-order
/// listing and store-assigned timestamps. Used by the directory core's unit
/// tests and the API crate's integration tests so neither needs a live
/// MongoDB.

use super::{StoreError, StoreResult, UserStore};
use crate::models::{User, UserFields};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::sync::Mutex;

/// In-memory user store
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
        self.users.lock().expect("user table lock poisoned")
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_page(&self, skip: u64, limit: i64) -> StoreResult<Vec<User>> {
        Ok(self
            .table()
            .iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.table().len() as u64)
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<User>> {
        let needle = query.to_lowercase();
        Ok(self
            .table()
            .iter()
            .filter(|user| {
                user.name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.table().iter().find(|user| user.id == id).cloned())
    }

    async fn insert(&self, fields: UserFields) -> StoreResult<User> {
        let mut table = self.table();

        if table
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(&fields.email))
        {
            return Err(StoreError::DuplicateKey(format!(
                "duplicate email: {}",
                fields.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: ObjectId::new().to_hex(),
            name: fields.name,
            email: fields.email,
            age: fields.age,
            role: fields.role,
            created_at: Some(now),
            updated_at: Some(now),
        };

        table.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: &str, fields: UserFields) -> StoreResult<Option<User>> {
        let mut table = self.table();

        // The unique index applies on update too
        if table
            .iter()
            .any(|user| user.id != id && user.email.eq_ignore_ascii_case(&fields.email))
        {
            return Err(StoreError::DuplicateKey(format!(
                "duplicate email: {}",
                fields.email
            )));
        }

        let Some(user) = table.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };

        user.name = fields.name;
        user.email = fields.email;
        user.age = fields.age;
        user.role = fields.role;
        user.updated_at = Some(Utc::now());

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: &str) -> StoreResult<Option<User>> {
        let mut table = self.table();
        let position = table.iter().position(|user| user.id == id);
        Ok(position.map(|index| table.remove(index)))
    }
}
