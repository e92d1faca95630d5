//! Marketing content: services, downloadable resources, case studies and
//! testimonials. Public reads only ever see `published` rows.

use crate::db::models::{CaseStudy, PublishStatus, Resource, ResourceKind, Service, Testimonial};
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use crate::types::pagination::{Paged, Pagination};
use chrono::Utc;
use sqlx::types::Json;

#[derive(Debug, Clone)]
pub struct ServiceWrite {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub description: String,
    pub icon: Option<String>,
    pub features: Vec<String>,
    pub sort_order: i64,
    pub status: PublishStatus,
}

#[derive(Clone)]
pub struct ServiceStore {
    pool: SqlitePool,
}

impl ServiceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_published(&self) -> Result<Vec<Service>, CmsError> {
        let rows = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE status = ? ORDER BY sort_order, title",
        )
        .bind(PublishStatus::Published)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list(&self, window: Pagination) -> Result<Paged<Service>, CmsError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, Service>(
            "SELECT * FROM services ORDER BY sort_order, id LIMIT ? OFFSET ?",
        )
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paged::new(rows, total, window))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Service>, CmsError> {
        let row = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_published(&self, slug: &str) -> Result<Option<Service>, CmsError> {
        let row = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE slug = ? AND status = ?")
            .bind(slug)
            .bind(PublishStatus::Published)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, input: ServiceWrite) -> Result<Service, CmsError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, Service>(
            r#"INSERT INTO services (
                   title, slug, summary, description, icon, features, sort_order, status,
                   created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(input.title)
        .bind(input.slug)
        .bind(input.summary)
        .bind(input.description)
        .bind(input.icon)
        .bind(Json(input.features))
        .bind(input.sort_order)
        .bind(input.status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i64, input: ServiceWrite) -> Result<Option<Service>, CmsError> {
        let row = sqlx::query_as::<_, Service>(
            r#"UPDATE services SET
                   title = ?, slug = ?, summary = ?, description = ?, icon = ?,
                   features = ?, sort_order = ?, status = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(input.title)
        .bind(input.slug)
        .bind(input.summary)
        .bind(input.description)
        .bind(input.icon)
        .bind(Json(input.features))
        .bind(input.sort_order)
        .bind(input.status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceWrite {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub kind: ResourceKind,
    pub file_url: String,
    pub gated: bool,
    pub status: PublishStatus,
}

#[derive(Clone)]
pub struct ResourceStore {
    pool: SqlitePool,
}

impl ResourceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_published(&self, kind: Option<ResourceKind>) -> Result<Vec<Resource>, CmsError> {
        let rows = sqlx::query_as::<_, Resource>(
            r#"SELECT * FROM resources
               WHERE status = ? AND COALESCE(? = kind, 1)
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(PublishStatus::Published)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list(&self, window: Pagination) -> Result<Paged<Resource>, CmsError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resources")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paged::new(rows, total, window))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Resource>, CmsError> {
        let row = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_published(&self, slug: &str) -> Result<Option<Resource>, CmsError> {
        let row =
            sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE slug = ? AND status = ?")
                .bind(slug)
                .bind(PublishStatus::Published)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    pub async fn create(&self, input: ResourceWrite) -> Result<Resource, CmsError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, Resource>(
            r#"INSERT INTO resources (
                   title, slug, description, kind, file_url, gated, status, created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(input.title)
        .bind(input.slug)
        .bind(input.description)
        .bind(input.kind)
        .bind(input.file_url)
        .bind(input.gated)
        .bind(input.status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i64, input: ResourceWrite) -> Result<Option<Resource>, CmsError> {
        let row = sqlx::query_as::<_, Resource>(
            r#"UPDATE resources SET
                   title = ?, slug = ?, description = ?, kind = ?, file_url = ?,
                   gated = ?, status = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(input.title)
        .bind(input.slug)
        .bind(input.description)
        .bind(input.kind)
        .bind(input.file_url)
        .bind(input.gated)
        .bind(input.status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn record_download(&self, id: i64) -> Result<(), CmsError> {
        sqlx::query("UPDATE resources SET download_count = download_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct CaseStudyWrite {
    pub title: String,
    pub slug: String,
    pub client: String,
    pub industry: String,
    pub summary: String,
    pub challenge: String,
    pub solution: String,
    pub results: Vec<String>,
    pub cover_image: Option<String>,
    pub status: PublishStatus,
}

#[derive(Clone)]
pub struct CaseStudyStore {
    pool: SqlitePool,
}

impl CaseStudyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_published(&self, industry: Option<&str>) -> Result<Vec<CaseStudy>, CmsError> {
        let rows = sqlx::query_as::<_, CaseStudy>(
            r#"SELECT * FROM case_studies
               WHERE status = ? AND COALESCE(? = industry, 1)
               ORDER BY published_at DESC, id DESC"#,
        )
        .bind(PublishStatus::Published)
        .bind(industry)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list(&self, window: Pagination) -> Result<Paged<CaseStudy>, CmsError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM case_studies")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, CaseStudy>(
            "SELECT * FROM case_studies ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paged::new(rows, total, window))
    }

    pub async fn get(&self, id: i64) -> Result<Option<CaseStudy>, CmsError> {
        let row = sqlx::query_as::<_, CaseStudy>("SELECT * FROM case_studies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_published(&self, slug: &str) -> Result<Option<CaseStudy>, CmsError> {
        let row = sqlx::query_as::<_, CaseStudy>(
            "SELECT * FROM case_studies WHERE slug = ? AND status = ?",
        )
        .bind(slug)
        .bind(PublishStatus::Published)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, input: CaseStudyWrite) -> Result<CaseStudy, CmsError> {
        let now = Utc::now();
        let published_at = (input.status == PublishStatus::Published).then_some(now);
        let row = sqlx::query_as::<_, CaseStudy>(
            r#"INSERT INTO case_studies (
                   title, slug, client, industry, summary, challenge, solution, results,
                   cover_image, status, published_at, created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(input.title)
        .bind(input.slug)
        .bind(input.client)
        .bind(input.industry)
        .bind(input.summary)
        .bind(input.challenge)
        .bind(input.solution)
        .bind(Json(input.results))
        .bind(input.cover_image)
        .bind(input.status)
        .bind(published_at)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i64, input: CaseStudyWrite) -> Result<Option<CaseStudy>, CmsError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, CaseStudy>(
            r#"UPDATE case_studies SET
                   title = ?, slug = ?, client = ?, industry = ?, summary = ?,
                   challenge = ?, solution = ?, results = ?, cover_image = ?, status = ?,
                   published_at = CASE
                       WHEN ? = 'published' AND published_at IS NULL THEN ?
                       ELSE published_at
                   END,
                   updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(input.title)
        .bind(input.slug)
        .bind(input.client)
        .bind(input.industry)
        .bind(input.summary)
        .bind(input.challenge)
        .bind(input.solution)
        .bind(Json(input.results))
        .bind(input.cover_image)
        .bind(input.status)
        .bind(input.status)
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM case_studies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct TestimonialWrite {
    pub author_name: String,
    pub author_title: Option<String>,
    pub company: Option<String>,
    pub quote: String,
    pub rating: i64,
    pub featured: bool,
    pub status: PublishStatus,
    pub sort_order: i64,
}

#[derive(Clone)]
pub struct TestimonialStore {
    pool: SqlitePool,
}

impl TestimonialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_published(&self, featured: Option<bool>) -> Result<Vec<Testimonial>, CmsError> {
        let rows = sqlx::query_as::<_, Testimonial>(
            r#"SELECT * FROM testimonials
               WHERE status = ? AND COALESCE(? = featured, 1)
               ORDER BY sort_order, id"#,
        )
        .bind(PublishStatus::Published)
        .bind(featured)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list(&self, window: Pagination) -> Result<Paged<Testimonial>, CmsError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM testimonials")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, Testimonial>(
            "SELECT * FROM testimonials ORDER BY sort_order, id LIMIT ? OFFSET ?",
        )
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paged::new(rows, total, window))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Testimonial>, CmsError> {
        let row = sqlx::query_as::<_, Testimonial>("SELECT * FROM testimonials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, input: TestimonialWrite) -> Result<Testimonial, CmsError> {
        let row = sqlx::query_as::<_, Testimonial>(
            r#"INSERT INTO testimonials (
                   author_name, author_title, company, quote, rating, featured, status,
                   sort_order, created_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(input.author_name)
        .bind(input.author_title)
        .bind(input.company)
        .bind(input.quote)
        .bind(input.rating)
        .bind(input.featured)
        .bind(input.status)
        .bind(input.sort_order)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(
        &self,
        id: i64,
        input: TestimonialWrite,
    ) -> Result<Option<Testimonial>, CmsError> {
        let row = sqlx::query_as::<_, Testimonial>(
            r#"UPDATE testimonials SET
                   author_name = ?, author_title = ?, company = ?, quote = ?, rating = ?,
                   featured = ?, status = ?, sort_order = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(input.author_name)
        .bind(input.author_title)
        .bind(input.company)
        .bind(input.quote)
        .bind(input.rating)
        .bind(input.featured)
        .bind(input.status)
        .bind(input.sort_order)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM testimonials WHERE id = ?")
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

    fn service(slug: &str, order: i64, status: PublishStatus) -> ServiceWrite {
        ServiceWrite {
            title: slug.to_uppercase(),
            slug: slug.to_string(),
            summary: "s".into(),
            description: "d".into(),
            icon: None,
            features: vec!["24/7 monitoring".into()],
            sort_order: order,
            status,
        }
    }

    #[tokio::test]
    async fn public_services_are_published_and_ordered() {
        let services = ServiceStore::new(temp_pool().await);
        services.create(service("pentest", 2, PublishStatus::Published)).await.unwrap();
        services.create(service("soc", 1, PublishStatus::Published)).await.unwrap();
        services.create(service("grc", 0, PublishStatus::Draft)).await.unwrap();
        let public = services.list_published().await.unwrap();
        let slugs: Vec<_> = public.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, ["soc", "pentest"]);
        assert_eq!(public[0].features.0, vec!["24/7 monitoring".to_string()]);
        assert!(services.get_published("grc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn testimonials_filter_featured() {
        let store = TestimonialStore::new(temp_pool().await);
        for (name, featured) in [("A", true), ("B", false)] {
            store
                .create(TestimonialWrite {
                    author_name: name.into(),
                    author_title: None,
                    company: None,
                    quote: "q".into(),
                    rating: 5,
                    featured,
                    status: PublishStatus::Published,
                    sort_order: 0,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.list_published(None).await.unwrap().len(), 2);
        let featured = store.list_published(Some(true)).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].author_name, "A");
    }

    #[tokio::test]
    async fn downloads_are_counted() {
        let store = ResourceStore::new(temp_pool().await);
        let r = store
            .create(ResourceWrite {
                title: "Ransomware Readiness".into(),
                slug: "ransomware-readiness".into(),
                description: "d".into(),
                kind: ResourceKind::Checklist,
                file_url: "https://cdn.example.com/r.pdf".into(),
                gated: true,
                status: PublishStatus::Published,
            })
            .await
            .unwrap();
        store.record_download(r.id).await.unwrap();
        let r = store.get_published("ransomware-readiness").await.unwrap().unwrap();
        assert_eq!(r.download_count, 1);
        assert_eq!(store.list_published(Some(ResourceKind::Ebook)).await.unwrap().len(), 0);
    }
}
