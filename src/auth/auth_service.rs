use crate::auth::jwt::{create_session_token, verify_session_token};
use crate::error::{AppError, Result};
use crate::schedule::AppTime;
use crate::user::{User, UserRepository};
use uuid::Uuid;

/// Account used when requests arrive without a session and auto-login is on.
pub const DEV_USERNAME: &str = "dev-user";

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    session_secret: String,
    session_ttl_hours: i64,
    time: AppTime,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        session_secret: String,
        session_ttl_hours: i64,
        time: AppTime,
    ) -> Self {
        Self {
            user_repo,
            session_secret,
            session_ttl_hours,
            time,
        }
    }

    pub fn session_ttl_hours(&self) -> i64 {
        self.session_ttl_hours
    }

    /// Stub login: any username is accepted and created on first use.
    pub async fn login(&self, username: &str) -> Result<(User, String)> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username is required".into()));
        }

        let user = self
            .user_repo
            .find_or_create(username, self.time.now_utc())
            .await?;
        let token = create_session_token(
            user.id,
            &user.username,
            &self.session_secret,
            self.session_ttl_hours,
            self.time.now_utc(),
        )?;

        tracing::info!(user_id = %user.id, "session started");
        Ok((user, token))
    }

    /// Resolves a session token to its user id.
    pub fn authenticate(&self, token: &str) -> Result<Uuid> {
        let claims = verify_session_token(token, &self.session_secret, self.time.now_utc())?;
        Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthenticated("Invalid session".to_string()))
    }

    pub async fn dev_user(&self) -> Result<User> {
        self.user_repo
            .find_or_create(DEV_USERNAME, self.time.now_utc())
            .await
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Session user no longer exists".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::test_pool, schedule::AppTime};

    async fn service() -> AuthService {
        let repo = UserRepository::new(test_pool().await);
        AuthService::new(repo, "secret".into(), 24, AppTime::system(chrono_tz::Asia::Singapore))
    }

    #[tokio::test]
    async fn test_login_issues_token_for_same_user() {
        let auth = service().await;
        let (user, token) = auth.login("  alice ").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(auth.authenticate(&token).unwrap(), user.id);

        let (again, _) = auth.login("alice").await.unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_login_rejects_blank_username() {
        let auth = service().await;
        assert!(matches!(auth.login("   ").await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthenticated() {
        let auth = service().await;
        assert!(matches!(
            auth.authenticate("not-a-token"),
            Err(AppError::Unauthenticated(_))
        ));
    }
}
