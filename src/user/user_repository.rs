use crate::{db::DbPool, error::Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use super::user_models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Returns the user with this name, creating it on first sight.
    pub async fn find_or_create(&self, username: &str, now: DateTime<Utc>) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, created_at) VALUES ($1, $2, $3)
             ON CONFLICT (username) DO UPDATE SET username = excluded.username
             RETURNING *"
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_find_or_create_is_stable() {
        let repo = UserRepository::new(test_pool().await);
        let now = Utc::now();

        let first = repo.find_or_create("alice", now).await.unwrap();
        let again = repo.find_or_create("alice", now).await.unwrap();
        let other = repo.find_or_create("bob", now).await.unwrap();

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
        assert_eq!(
            repo.find_by_id(first.id).await.unwrap().map(|u| u.username),
            Some("alice".to_string())
        );
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
