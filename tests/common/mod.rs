#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use user_service::{
    AppConfig, AppState, InMemoryRepository, UserRepository,
    auth::Requester,
    error::StoreResult,
    models::{Role, UpdateUserRequest, User, UserId},
};

pub const USER_ID: UserId = 1;
pub const OTHER_ID: UserId = 2;
pub const ADMIN_ID: UserId = 3;

pub fn user(id: UserId, role: Role) -> User {
    let now = Utc::now();
    User {
        id,
        name: format!("User {id}"),
        email: format!("user{id}@example.com"),
        role,
        created_at: now,
        updated_at: now,
    }
}

/// Two regular users and one admin.
pub fn seeded_repo() -> InMemoryRepository {
    InMemoryRepository::with_users([
        user(USER_ID, Role::User),
        user(OTHER_ID, Role::User),
        user(ADMIN_ID, Role::Admin),
    ])
}

pub fn state_with(repo: impl UserRepository + 'static) -> AppState {
    AppState {
        repo: Arc::new(repo),
        config: AppConfig::default(),
    }
}

pub fn requester(id: UserId, role: Role) -> Requester {
    Requester { id, role }
}

/// Wraps an in-memory store and counts every call that reaches it.
#[derive(Default)]
pub struct SpyRepo {
    pub inner: InMemoryRepository,
    pub calls: Arc<AtomicUsize>,
}

impl SpyRepo {
    pub fn new(inner: InMemoryRepository) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for SpyRepo {
    async fn get_users(&self) -> StoreResult<Vec<User>> {
        self.hit();
        self.inner.get_users().await
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.hit();
        self.inner.get_user(id).await
    }

    async fn update_user(&self, id: UserId, changes: UpdateUserRequest) -> StoreResult<User> {
        self.hit();
        self.inner.update_user(id, changes).await
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        self.hit();
        self.inner.delete_user(id).await
    }
}
