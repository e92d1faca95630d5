use crate::db::models::{Category, Tag, TermCount};
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use chrono::Utc;

#[derive(Clone)]
pub struct CategoryStore {
    pool: SqlitePool,
}

impl CategoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Category>, CmsError> {
        let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Categories with their count of published posts.
    pub async fn list_with_counts(&self) -> Result<Vec<TermCount>, CmsError> {
        let rows = sqlx::query_as::<_, TermCount>(
            r#"SELECT c.id, c.name, c.slug, COUNT(p.id) AS post_count
               FROM categories c
               LEFT JOIN posts p ON p.category_id = c.id AND p.status = 'published'
               GROUP BY c.id
               ORDER BY c.name"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Category>, CmsError> {
        let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, CmsError> {
        let row = sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (name, slug, description, created_at)
               VALUES (?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(
        &self,
        id: i64,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Option<Category>, CmsError> {
        let row = sqlx::query_as::<_, Category>(
            r#"UPDATE categories SET name = ?, slug = ?, description = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Posts in the category keep existing with no category.
    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct TagStore {
    pool: SqlitePool,
}

impl TagStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Tag>, CmsError> {
        let rows = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_with_counts(&self) -> Result<Vec<TermCount>, CmsError> {
        let rows = sqlx::query_as::<_, TermCount>(
            r#"SELECT t.id, t.name, t.slug, COUNT(p.id) AS post_count
               FROM tags t
               LEFT JOIN post_tags pt ON pt.tag_id = t.id
               LEFT JOIN posts p ON p.id = pt.post_id AND p.status = 'published'
               GROUP BY t.id
               ORDER BY t.name"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, name: &str, slug: &str) -> Result<Tag, CmsError> {
        let row = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, slug, created_at) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(name)
        .bind(slug)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i64, name: &str, slug: &str) -> Result<Option<Tag>, CmsError> {
        let row = sqlx::query_as::<_, Tag>(
            "UPDATE tags SET name = ?, slug = ? WHERE id = ? RETURNING *",
        )
        .bind(name)
        .bind(slug)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::testing::temp_pool;

    #[tokio::test]
    async fn counts_only_published_posts() {
        let pool = temp_pool().await;
        let categories = CategoryStore::new(pool.clone());
        let cat = categories.create("Threat Intel", "threat-intel", None).await.unwrap();
        let now = Utc::now();
        for (slug, status) in [("a", "published"), ("b", "draft")] {
            sqlx::query(
                r#"INSERT INTO posts (title, slug, content, status, category_id, created_at, updated_at)
                   VALUES (?, ?, 'x', ?, ?, ?, ?)"#,
            )
            .bind(slug)
            .bind(slug)
            .bind(status)
            .bind(cat.id)
            .bind(now)
            .bind(now)
            .execute(&pool)
            .await
            .unwrap();
        }
        let counts = categories.list_with_counts().await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].post_count, 1);
    }
}
