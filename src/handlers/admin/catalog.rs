//! Services, resources, case studies and testimonials.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use super::derive_slug;
use crate::db::catalog::{CaseStudyWrite, ResourceWrite, ServiceWrite, TestimonialWrite};
use crate::db::models::{CaseStudy, Resource, Service, Testimonial};
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::types::admin::{CaseStudyInput, ResourceInput, ServiceInput, TestimonialInput};
use crate::types::forms::clean;
use crate::types::pagination::Paged;
use crate::types::query::PageQuery;

fn trimmed_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn service_write(input: ServiceInput) -> Result<ServiceWrite, CmsError> {
    Ok(ServiceWrite {
        slug: derive_slug(input.slug.as_deref(), &input.title)?,
        title: input.title.trim().to_string(),
        summary: input.summary,
        description: input.description,
        icon: clean(input.icon),
        features: trimmed_list(input.features),
        sort_order: input.sort_order,
        status: input.status,
    })
}

fn resource_write(input: ResourceInput) -> Result<ResourceWrite, CmsError> {
    Ok(ResourceWrite {
        slug: derive_slug(input.slug.as_deref(), &input.title)?,
        title: input.title.trim().to_string(),
        description: input.description,
        kind: input.kind,
        file_url: input.file_url.trim().to_string(),
        gated: input.gated,
        status: input.status,
    })
}

fn case_study_write(input: CaseStudyInput) -> Result<CaseStudyWrite, CmsError> {
    Ok(CaseStudyWrite {
        slug: derive_slug(input.slug.as_deref(), &input.title)?,
        title: input.title.trim().to_string(),
        client: input.client.trim().to_string(),
        industry: input.industry.trim().to_string(),
        summary: input.summary,
        challenge: input.challenge,
        solution: input.solution,
        results: trimmed_list(input.results),
        cover_image: clean(input.cover_image),
        status: input.status,
    })
}

fn testimonial_write(input: TestimonialInput) -> TestimonialWrite {
    TestimonialWrite {
        author_name: input.author_name.trim().to_string(),
        author_title: clean(input.author_title),
        company: clean(input.company),
        quote: input.quote.trim().to_string(),
        rating: input.rating,
        featured: input.featured,
        status: input.status,
        sort_order: input.sort_order,
    }
}

pub async fn list_services(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<Service>>, CmsError> {
    current.require(Permission::ContentRead)?;
    Ok(Json(state.services().list(query.window()).await?))
}

pub async fn get_service(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Service>, CmsError> {
    current.require(Permission::ContentRead)?;
    state
        .services()
        .get(id)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("service"))
}

pub async fn create_service(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(input): ValidatedJson<ServiceInput>,
) -> Result<(StatusCode, Json<Service>), CmsError> {
    current.require(Permission::ContentWrite)?;
    let service = state.services().create(service_write(input)?).await?;
    info!(service_id = service.id, slug = %service.slug, "service created");
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn update_service(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<ServiceInput>,
) -> Result<Json<Service>, CmsError> {
    current.require(Permission::ContentWrite)?;
    state
        .services()
        .update(id, service_write(input)?)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("service"))
}

pub async fn delete_service(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::ContentWrite)?;
    if !state.services().delete(id).await? {
        return Err(CmsError::NotFound("service"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_resources(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<Resource>>, CmsError> {
    current.require(Permission::ContentRead)?;
    Ok(Json(state.resources().list(query.window()).await?))
}

pub async fn get_resource(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Resource>, CmsError> {
    current.require(Permission::ContentRead)?;
    state
        .resources()
        .get(id)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("resource"))
}

pub async fn create_resource(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(input): ValidatedJson<ResourceInput>,
) -> Result<(StatusCode, Json<Resource>), CmsError> {
    current.require(Permission::ContentWrite)?;
    let resource = state.resources().create(resource_write(input)?).await?;
    info!(resource_id = resource.id, slug = %resource.slug, "resource created");
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn update_resource(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<ResourceInput>,
) -> Result<Json<Resource>, CmsError> {
    current.require(Permission::ContentWrite)?;
    state
        .resources()
        .update(id, resource_write(input)?)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("resource"))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::ContentWrite)?;
    if !state.resources().delete(id).await? {
        return Err(CmsError::NotFound("resource"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_case_studies(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<CaseStudy>>, CmsError> {
    current.require(Permission::ContentRead)?;
    Ok(Json(state.case_studies().list(query.window()).await?))
}

pub async fn get_case_study(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<CaseStudy>, CmsError> {
    current.require(Permission::ContentRead)?;
    state
        .case_studies()
        .get(id)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("case study"))
}

pub async fn create_case_study(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(input): ValidatedJson<CaseStudyInput>,
) -> Result<(StatusCode, Json<CaseStudy>), CmsError> {
    current.require(Permission::ContentWrite)?;
    let study = state.case_studies().create(case_study_write(input)?).await?;
    info!(case_study_id = study.id, slug = %study.slug, "case study created");
    Ok((StatusCode::CREATED, Json(study)))
}

pub async fn update_case_study(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<CaseStudyInput>,
) -> Result<Json<CaseStudy>, CmsError> {
    current.require(Permission::ContentWrite)?;
    state
        .case_studies()
        .update(id, case_study_write(input)?)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("case study"))
}

pub async fn delete_case_study(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::ContentWrite)?;
    if !state.case_studies().delete(id).await? {
        return Err(CmsError::NotFound("case study"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_testimonials(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<Testimonial>>, CmsError> {
    current.require(Permission::ContentRead)?;
    Ok(Json(state.testimonials().list(query.window()).await?))
}

pub async fn get_testimonial(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Testimonial>, CmsError> {
    current.require(Permission::ContentRead)?;
    state
        .testimonials()
        .get(id)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("testimonial"))
}

pub async fn create_testimonial(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(input): ValidatedJson<TestimonialInput>,
) -> Result<(StatusCode, Json<Testimonial>), CmsError> {
    current.require(Permission::ContentWrite)?;
    let testimonial = state
        .testimonials()
        .create(testimonial_write(input))
        .await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

pub async fn update_testimonial(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<TestimonialInput>,
) -> Result<Json<Testimonial>, CmsError> {
    current.require(Permission::ContentWrite)?;
    state
        .testimonials()
        .update(id, testimonial_write(input))
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("testimonial"))
}

pub async fn delete_testimonial(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::ContentWrite)?;
    if !state.testimonials().delete(id).await? {
        return Err(CmsError::NotFound("testimonial"));
    }
    Ok(StatusCode::NO_CONTENT)
}
