use crate::db::models::{Comment, CommentStatus, ModerationComment};
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use crate::types::pagination::{Paged, Pagination};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
}

pub struct NewComment<'a> {
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub author_name: &'a str,
    pub author_email: &'a str,
    pub content: &'a str,
}

impl CommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: NewComment<'_>) -> Result<Comment, CmsError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"INSERT INTO comments (post_id, parent_id, author_name, author_email, content, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(input.post_id)
        .bind(input.parent_id)
        .bind(input.author_name)
        .bind(input.author_email)
        .bind(input.content)
        .bind(CommentStatus::Pending)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Comment>, CmsError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    /// Approved comments of a post, oldest first.
    pub async fn approved_for_post(&self, post_id: i64) -> Result<Vec<Comment>, CmsError> {
        let rows = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = ? AND status = ? ORDER BY created_at, id",
        )
        .bind(post_id)
        .bind(CommentStatus::Approved)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list(
        &self,
        status: Option<CommentStatus>,
        post_id: Option<i64>,
        window: Pagination,
    ) -> Result<Paged<ModerationComment>, CmsError> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM comments c WHERE 1 = 1");
        apply_filter(&mut count_qb, status, post_id);
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT c.id, c.post_id, p.title AS post_title, c.parent_id, c.author_name, \
             c.author_email, c.content, c.status, c.likes, c.created_at \
             FROM comments c JOIN posts p ON p.id = c.post_id WHERE 1 = 1",
        );
        apply_filter(&mut qb, status, post_id);
        qb.push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset());
        let rows = qb
            .build_query_as::<ModerationComment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(Paged::new(rows, total, window))
    }

    pub async fn set_status(
        &self,
        id: i64,
        status: CommentStatus,
    ) -> Result<Option<Comment>, CmsError> {
        let comment = sqlx::query_as::<_, Comment>(
            "UPDATE comments SET status = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    /// Add one like to an approved comment; returns the new total.
    pub async fn like(&self, id: i64) -> Result<Option<i64>, CmsError> {
        let likes: Option<(i64,)> = sqlx::query_as(
            "UPDATE comments SET likes = likes + 1 WHERE id = ? AND status = ? RETURNING likes",
        )
        .bind(id)
        .bind(CommentStatus::Approved)
        .fetch_optional(&self.pool)
        .await?;
        Ok(likes.map(|(n,)| n))
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn count_by_status(&self, status: CommentStatus) -> Result<i64, CmsError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE status = ?")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

fn apply_filter(
    qb: &mut QueryBuilder<'_, Sqlite>,
    status: Option<CommentStatus>,
    post_id: Option<i64>,
) {
    if let Some(status) = status {
        qb.push(" AND c.status = ").push_bind(status);
    }
    if let Some(post_id) = post_id {
        qb.push(" AND c.post_id = ").push_bind(post_id);
    }
}
