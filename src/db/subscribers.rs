use crate::db::models::{Subscriber, SubscriberStatus};
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use crate::types::pagination::{Paged, Pagination};
use chrono::Utc;

#[derive(Clone)]
pub struct SubscriberStore {
    pool: SqlitePool,
}

/// Token pair minted for every (re)subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionTokens {
    pub confirm: String,
    pub unsubscribe: String,
}

impl SubscriberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, CmsError> {
        let row = sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        tokens: &SubscriptionTokens,
    ) -> Result<Subscriber, CmsError> {
        let row = sqlx::query_as::<_, Subscriber>(
            r#"INSERT INTO subscribers (email, name, status, confirm_token, unsubscribe_token, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(email)
        .bind(name)
        .bind(SubscriberStatus::Pending)
        .bind(&tokens.confirm)
        .bind(&tokens.unsubscribe)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Put a previously unsubscribed address back into `pending` with fresh tokens.
    pub async fn resubscribe(
        &self,
        id: i64,
        name: Option<&str>,
        tokens: &SubscriptionTokens,
    ) -> Result<Subscriber, CmsError> {
        let row = sqlx::query_as::<_, Subscriber>(
            r#"UPDATE subscribers SET
                   status = ?, name = COALESCE(?, name),
                   confirm_token = ?, unsubscribe_token = ?,
                   confirmed_at = NULL, unsubscribed_at = NULL
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(SubscriberStatus::Pending)
        .bind(name)
        .bind(&tokens.confirm)
        .bind(&tokens.unsubscribe)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Activate the subscription owning `token`. Already-active rows keep
    /// their original `confirmed_at`; unsubscribed rows are not revived.
    pub async fn confirm(&self, token: &str) -> Result<Option<Subscriber>, CmsError> {
        let row = sqlx::query_as::<_, Subscriber>(
            r#"UPDATE subscribers SET
                   status = ?, confirmed_at = COALESCE(confirmed_at, ?)
               WHERE confirm_token = ? AND status IN ('pending', 'active')
               RETURNING *"#,
        )
        .bind(SubscriberStatus::Active)
        .bind(Utc::now())
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn unsubscribe(&self, token: &str) -> Result<Option<Subscriber>, CmsError> {
        let row = sqlx::query_as::<_, Subscriber>(
            r#"UPDATE subscribers SET
                   status = ?, unsubscribed_at = COALESCE(unsubscribed_at, ?)
               WHERE unsubscribe_token = ?
               RETURNING *"#,
        )
        .bind(SubscriberStatus::Unsubscribed)
        .bind(Utc::now())
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(
        &self,
        status: Option<SubscriberStatus>,
        window: Pagination,
    ) -> Result<Paged<Subscriber>, CmsError> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscribers WHERE COALESCE(? = status, 1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        let rows = sqlx::query_as::<_, Subscriber>(
            r#"SELECT * FROM subscribers WHERE COALESCE(? = status, 1)
               ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"#,
        )
        .bind(status)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paged::new(rows, total, window))
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM subscribers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn count_by_status(&self, status: SubscriberStatus) -> Result<i64, CmsError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscribers WHERE status = ?")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
