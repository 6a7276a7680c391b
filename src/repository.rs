use crate::{
    error::{StoreError, StoreResult},
    models::{UpdateUserRequest, User, UserId},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, migrate::Migrator};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

/// UserRepository
///
/// The persistence contract consumed by the handlers. Rows are created elsewhere;
/// this service only reads, updates and deletes them.
///
/// Implementations report a missing row as `StoreError::NotFound` and anything else
/// as one of the other variants. Single-row update and delete are atomic.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_users(&self) -> StoreResult<Vec<User>>;

    async fn get_user(&self, id: UserId) -> StoreResult<User>;

    /// Applies only the `Some` fields of `changes` and bumps `updated_at`.
    async fn update_user(&self, id: UserId, changes: UpdateUserRequest) -> StoreResult<User>;

    async fn delete_user(&self, id: UserId) -> StoreResult<()>;
}

/// RepositoryState
///
/// The shared handle placed in `AppState`.
pub type RepositoryState = Arc<dyn UserRepository>;

/// PostgresRepository
///
/// `UserRepository` backed by the `users` table.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Brings the schema up to date. Called once at startup.
    pub async fn migrate(&self) -> StoreResult<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn get_users(&self) -> StoreResult<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    /// COALESCE keeps the stored value for every column whose parameter is NULL.
    async fn update_user(&self, id: UserId, changes: UpdateUserRequest) -> StoreResult<User> {
        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.role.map(|role| role.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

/// InMemoryRepository
///
/// `UserRepository` over a map behind a `RwLock`. Used by the test suite and for
/// local runs without `DATABASE_URL`.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<BTreeMap<UserId, User>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the store with `users`, keyed by their ids.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_user(&self, id: UserId, changes: UpdateUserRequest) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
