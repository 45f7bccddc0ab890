use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

/// `UserStore` kept in process memory. Uniqueness is checked and the row
/// inserted under one write lock, mirroring the unique index of the SQL schema.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
    unavailable: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn count_by_email(&self, email: &str) -> usize {
        self.users
            .read()
            .await
            .values()
            .filter(|u| u.email == email)
            .count()
    }

    pub async fn remove(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser<'_>) -> Result<User, StoreError> {
        self.check_available()?;
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Duplicate);
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.to_owned(),
            password_hash: new_user.password_hash.to_owned(),
            name: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user<'a>(email: &'a str) -> NewUser<'a> {
        NewUser {
            email,
            password_hash: "$argon2id$stub",
        }
    }

    #[tokio::test]
    async fn create_then_lookup() {
        let store = MemoryUserStore::new();
        let created = store.create(new_user("a@b.com")).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);
        assert!(created.name.is_none());

        let by_email = store.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@b.com");
    }

    #[tokio::test]
    async fn email_match_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@b.com")).await.unwrap();
        assert!(store.find_by_email("A@B.com").await.unwrap().is_none());
        store.create(new_user("A@B.com")).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@b.com")).await.unwrap();
        let err = store.create(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
        assert_eq!(store.count_by_email("a@b.com").await, 1);
    }

    #[tokio::test]
    async fn concurrent_duplicates_insert_once() {
        let store = std::sync::Arc::new(MemoryUserStore::new());
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_user("race@b.com")).await.is_ok() })
            })
            .collect();

        let mut created = 0;
        for t in tasks {
            if t.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.count_by_email("race@b.com").await, 1);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryUserStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.find_by_email("a@b.com").await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_unavailable(false);
        assert!(store.find_by_email("a@b.com").await.unwrap().is_none());
    }
}
