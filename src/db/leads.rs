use crate::db::models::{Lead, LeadSource, LeadStatus};
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use crate::types::pagination::{Paged, Pagination};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

#[derive(Clone)]
pub struct LeadStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub service_interest: Option<String>,
    pub source: LeadSource,
    pub resource_id: Option<i64>,
}

impl NewLead {
    pub fn new(name: impl Into<String>, email: impl Into<String>, source: LeadSource) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            company: None,
            phone: None,
            message: None,
            service_interest: None,
            source,
            resource_id: None,
        }
    }
}

/// Insert on a caller-held connection so the lead can share a transaction.
pub(crate) async fn insert_lead(conn: &mut SqliteConnection, lead: NewLead) -> Result<Lead, CmsError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, Lead>(
        r#"INSERT INTO leads (
               name, email, company, phone, message, service_interest,
               source, status, resource_id, created_at, updated_at
           ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING *"#,
    )
    .bind(lead.name)
    .bind(lead.email)
    .bind(lead.company)
    .bind(lead.phone)
    .bind(lead.message)
    .bind(lead.service_interest)
    .bind(lead.source)
    .bind(LeadStatus::New)
    .bind(lead.resource_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

impl LeadStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, lead: NewLead) -> Result<Lead, CmsError> {
        let mut conn = self.pool.acquire().await?;
        insert_lead(&mut conn, lead).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Lead>, CmsError> {
        let row = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list(
        &self,
        status: Option<LeadStatus>,
        source: Option<LeadSource>,
        window: Pagination,
    ) -> Result<Paged<Lead>, CmsError> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM leads WHERE 1 = 1");
        apply_filter(&mut count_qb, status, source);
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM leads WHERE 1 = 1");
        apply_filter(&mut qb, status, source);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset());
        let rows = qb.build_query_as::<Lead>().fetch_all(&self.pool).await?;
        Ok(Paged::new(rows, total, window))
    }

    /// Every lead, newest first; used by the CSV export.
    pub async fn all(&self) -> Result<Vec<Lead>, CmsError> {
        let rows = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn set_status(&self, id: i64, status: LeadStatus) -> Result<Option<Lead>, CmsError> {
        let row = sqlx::query_as::<_, Lead>(
            "UPDATE leads SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM leads WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn count_by_status(&self, status: LeadStatus) -> Result<i64, CmsError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads WHERE status = ?")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

fn apply_filter(
    qb: &mut QueryBuilder<'_, Sqlite>,
    status: Option<LeadStatus>,
    source: Option<LeadSource>,
) {
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(source) = source {
        qb.push(" AND source = ").push_bind(source);
    }
}
