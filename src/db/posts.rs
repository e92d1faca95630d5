use crate::db::models::{Post, PublishStatus, Tag};
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use crate::types::pagination::{Paged, Pagination};
use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite, Transaction};
use std::collections::HashMap;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

/// Optional list filters; all present filters must match.
#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    pub status: Option<PublishStatus>,
    pub category_slug: Option<String>,
    pub tag_slug: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

impl PostFilter {
    fn apply(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(status) = self.status {
            qb.push(" AND p.status = ").push_bind(status);
        }
        if let Some(slug) = &self.category_slug {
            qb.push(" AND p.category_id IN (SELECT id FROM categories WHERE slug = ")
                .push_bind(slug.clone())
                .push(")");
        }
        if let Some(slug) = &self.tag_slug {
            qb.push(
                " AND EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.post_id = p.id AND t.slug = ",
            )
            .push_bind(slug.clone())
            .push(")");
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{term}%");
            qb.push(" AND (p.title LIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.excerpt LIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.content LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(featured) = self.featured {
            qb.push(" AND p.featured = ").push_bind(featured);
        }
    }
}

/// Column values for insert and full update.
#[derive(Debug, Clone)]
pub struct PostWrite {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub status: PublishStatus,
    pub category_id: Option<i64>,
    pub featured: bool,
    pub reading_minutes: i64,
    pub tag_ids: Vec<i64>,
}

#[derive(FromRow)]
struct PostTagRow {
    post_id: i64,
    #[sqlx(flatten)]
    tag: Tag,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &PostFilter,
        window: Pagination,
    ) -> Result<Paged<Post>, CmsError> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p WHERE 1 = 1");
        filter.apply(&mut count_qb);
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT p.* FROM posts p WHERE 1 = 1");
        filter.apply(&mut qb);
        qb.push(" ORDER BY COALESCE(p.published_at, p.created_at) DESC, p.id DESC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset());
        let posts = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;
        Ok(Paged::new(posts, total, window))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Post>, CmsError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, CmsError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    pub async fn slug_taken(&self, slug: &str, except_id: Option<i64>) -> Result<bool, CmsError> {
        let (n,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM posts WHERE slug = ? AND id != COALESCE(?, -1)")
                .bind(slug)
                .bind(except_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(n > 0)
    }

    pub async fn create(&self, input: PostWrite, author_id: i64) -> Result<Post, CmsError> {
        let now = Utc::now();
        let published_at = (input.status == PublishStatus::Published).then_some(now);
        let mut tx = self.pool.begin().await?;
        let post = sqlx::query_as::<_, Post>(
            r#"INSERT INTO posts (
                   title, slug, excerpt, content, cover_image, status, category_id,
                   author_id, featured, reading_minutes, published_at, created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.excerpt)
        .bind(&input.content)
        .bind(&input.cover_image)
        .bind(input.status)
        .bind(input.category_id)
        .bind(author_id)
        .bind(input.featured)
        .bind(input.reading_minutes)
        .bind(published_at)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        replace_tags(&mut tx, post.id, &input.tag_ids).await?;
        tx.commit().await?;
        Ok(post)
    }

    /// Full update. `published_at` is stamped on the first transition to
    /// published and kept afterwards.
    pub async fn update(&self, id: i64, input: PostWrite) -> Result<Option<Post>, CmsError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let post = sqlx::query_as::<_, Post>(
            r#"UPDATE posts SET
                   title = ?, slug = ?, excerpt = ?, content = ?, cover_image = ?,
                   status = ?, category_id = ?, featured = ?, reading_minutes = ?,
                   published_at = CASE
                       WHEN ? = 'published' AND published_at IS NULL THEN ?
                       ELSE published_at
                   END,
                   updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.excerpt)
        .bind(&input.content)
        .bind(&input.cover_image)
        .bind(input.status)
        .bind(input.category_id)
        .bind(input.featured)
        .bind(input.reading_minutes)
        .bind(input.status)
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(post) = post else {
            return Ok(None);
        };
        replace_tags(&mut tx, post.id, &input.tag_ids).await?;
        tx.commit().await?;
        Ok(Some(post))
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn increment_views(&self, id: i64) -> Result<(), CmsError> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn tags_for(&self, post_id: i64) -> Result<Vec<Tag>, CmsError> {
        let mut map = self.tags_for_many(&[post_id]).await?;
        Ok(map.remove(&post_id).unwrap_or_default())
    }

    pub async fn tags_for_many(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>, CmsError> {
        let mut out: HashMap<i64, Vec<Tag>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(out);
        }
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT pt.post_id, t.id, t.name, t.slug, t.created_at \
             FROM post_tags pt JOIN tags t ON t.id = pt.tag_id WHERE pt.post_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in post_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY t.name");
        let rows = qb.build_query_as::<PostTagRow>().fetch_all(&self.pool).await?;
        for row in rows {
            out.entry(row.post_id).or_default().push(row.tag);
        }
        Ok(out)
    }

    pub async fn count_by_status(&self) -> Result<Vec<(PublishStatus, i64)>, CmsError> {
        let rows: Vec<(PublishStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM posts GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}

async fn replace_tags(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: i64,
    tag_ids: &[i64],
) -> Result<(), CmsError> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;
    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;
    use crate::db::sqlite::testing::temp_pool;
    use crate::db::taxonomy::TagStore;
    use crate::db::users::UserStore;

    fn write(slug: &str, status: PublishStatus, tag_ids: Vec<i64>) -> PostWrite {
        PostWrite {
            title: format!("Post {slug}"),
            slug: slug.to_string(),
            excerpt: None,
            content: "zero trust segmentation".to_string(),
            cover_image: None,
            status,
            category_id: None,
            featured: false,
            reading_minutes: 1,
            tag_ids,
        }
    }

    #[tokio::test]
    async fn published_at_is_stamped_once() {
        let pool = temp_pool().await;
        let author = UserStore::new(pool.clone())
            .create("ed@example.com", "Ed", "hash", Role::Editor)
            .await
            .unwrap();
        let posts = PostStore::new(pool);
        let draft = posts
            .create(write("p1", PublishStatus::Draft, vec![]), author.id)
            .await
            .unwrap();
        assert!(draft.published_at.is_none());

        let published = posts
            .update(draft.id, write("p1", PublishStatus::Published, vec![]))
            .await
            .unwrap()
            .unwrap();
        let first = published.published_at.expect("stamped on publish");

        let archived = posts
            .update(draft.id, write("p1", PublishStatus::Archived, vec![]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(archived.published_at, Some(first));
    }

    #[tokio::test]
    async fn filters_by_tag_and_search() {
        let pool = temp_pool().await;
        let author = UserStore::new(pool.clone())
            .create("ed@example.com", "Ed", "hash", Role::Editor)
            .await
            .unwrap();
        let tag = TagStore::new(pool.clone()).create("Cloud", "cloud").await.unwrap();
        let posts = PostStore::new(pool);
        posts
            .create(write("tagged", PublishStatus::Published, vec![tag.id, tag.id]), author.id)
            .await
            .unwrap();
        posts
            .create(write("plain", PublishStatus::Published, vec![]), author.id)
            .await
            .unwrap();

        let by_tag = PostFilter {
            tag_slug: Some("cloud".into()),
            ..Default::default()
        };
        let page = posts.list(&by_tag, Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "tagged");

        let by_search = PostFilter {
            search: Some("segmentation".into()),
            ..Default::default()
        };
        assert_eq!(posts.list(&by_search, Pagination::default()).await.unwrap().total, 2);

        let tags = posts.tags_for(page.items[0].id).await.unwrap();
        assert_eq!(tags.len(), 1);
    }
}
