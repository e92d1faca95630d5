use crate::db::models::{Role, Session, User};
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use crate::types::pagination::{Paged, Pagination};
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Fields an admin may change on an account; `None` leaves the column as is.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, CmsError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn count_role(&self, role: Role) -> Result<i64, CmsError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, CmsError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (email, name, password_hash, role, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(role)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>, CmsError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, CmsError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, window: Pagination) -> Result<Paged<User>, CmsError> {
        let total = self.count().await?;
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?")
            .bind(window.limit)
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Paged::new(users, total, window))
    }

    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, CmsError> {
        let user = sqlx::query_as::<_, User>(
            r#"UPDATE users SET
                name = COALESCE(?, name),
                role = COALESCE(?, role),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(changes.name)
        .bind(changes.role)
        .bind(changes.password_hash)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, CmsError> {
        let session = sqlx::query_as::<_, Session>(
            r#"INSERT INTO sessions (user_id, token_hash, expires_at, created_at)
               VALUES (?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Session>, CmsError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CmsError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_for_user(&self, user_id: i64) -> Result<u64, CmsError> {
        let res = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, CmsError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::testing::temp_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let users = UserStore::new(temp_pool().await);
        users
            .create("a@example.com", "A", "hash", Role::Editor)
            .await
            .unwrap();
        let err = users
            .create("a@example.com", "B", "hash", Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_keeps_unset_fields() {
        let users = UserStore::new(temp_pool().await);
        let u = users
            .create("b@example.com", "Bea", "hash", Role::User)
            .await
            .unwrap();
        let updated = users
            .update(
                u.id,
                UserChanges {
                    role: Some(Role::Editor),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, Role::Editor);
        assert_eq!(updated.name, "Bea");
        assert_eq!(updated.password_hash, "hash");
    }

    #[tokio::test]
    async fn expired_sessions_are_purged() {
        let pool = temp_pool().await;
        let users = UserStore::new(pool.clone());
        let sessions = SessionStore::new(pool);
        let u = users
            .create("c@example.com", "C", "hash", Role::Admin)
            .await
            .unwrap();
        let now = Utc::now();
        sessions
            .create(u.id, "old", now - Duration::hours(1))
            .await
            .unwrap();
        sessions
            .create(u.id, "fresh", now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(sessions.purge_expired(now).await.unwrap(), 1);
        assert!(sessions.find_by_hash("old").await.unwrap().is_none());
        assert!(sessions.find_by_hash("fresh").await.unwrap().is_some());
    }
}
