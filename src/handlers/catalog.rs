use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use serde_json::{Map, Value};
use tracing::info;
use validator::Validate;

use crate::db::leads::NewLead;
use crate::db::models::{CaseStudy, LeadSource, Resource, Service, Testimonial};
use crate::error::CmsError;
use crate::middleware::rate_limit::{Bucket, ClientIp};
use crate::router::AppState;
use crate::service::mailer::deliver;
use crate::service::notifications::lead_notification;
use crate::types::forms::{DownloadInput, clean, normalize_email};
use crate::types::query::{FeaturedQuery, IndustryQuery, ResourceQuery};
use crate::types::views::DownloadView;

/// GET /api/services
pub async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>, CmsError> {
    Ok(Json(state.services().list_published().await?))
}

/// GET /api/services/{slug}
pub async fn get_service(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Service>, CmsError> {
    state
        .services()
        .get_published(&slug)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("service"))
}

/// GET /api/case-studies
pub async fn list_case_studies(
    State(state): State<AppState>,
    Query(query): Query<IndustryQuery>,
) -> Result<Json<Vec<CaseStudy>>, CmsError> {
    let industry = query.industry.as_deref().filter(|s| !s.is_empty());
    Ok(Json(state.case_studies().list_published(industry).await?))
}

/// GET /api/case-studies/{slug}
pub async fn get_case_study(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CaseStudy>, CmsError> {
    state
        .case_studies()
        .get_published(&slug)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("case study"))
}

/// GET /api/testimonials
pub async fn list_testimonials(
    State(state): State<AppState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<Vec<Testimonial>>, CmsError> {
    Ok(Json(state.testimonials().list_published(query.featured).await?))
}

/// GET /api/resources
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<Json<Vec<Resource>>, CmsError> {
    Ok(Json(state.resources().list_published(query.kind).await?))
}

/// GET /api/resources/{slug}
pub async fn get_resource(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Resource>, CmsError> {
    state
        .resources()
        .get_published(&slug)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("resource"))
}

/// POST /api/resources/{slug}/download
///
/// The body may be empty for open resources. Gated resources need a name
/// and email, which are stored as a `download` lead.
pub async fn download_resource(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(slug): Path<String>,
    body: Bytes,
) -> Result<Json<DownloadView>, CmsError> {
    state.limits.check(Bucket::Forms, ip)?;

    let input = if body.iter().all(u8::is_ascii_whitespace) {
        DownloadInput::default()
    } else {
        serde_json::from_slice::<DownloadInput>(&body)
            .map_err(|e| CmsError::BadRequest(format!("malformed JSON body: {e}")))?
    };
    input.validate()?;

    let resources = state.resources();
    let resource = resources
        .get_published(&slug)
        .await?
        .ok_or(CmsError::NotFound("resource"))?;

    if resource.gated {
        let (Some(name), Some(email)) = (clean(input.name), input.email.as_deref()) else {
            return Err(CmsError::BadRequest(
                "name and email are required to download this resource".to_string(),
            ));
        };
        let lead = NewLead {
            company: clean(input.company),
            message: Some(format!("Downloaded \"{}\"", resource.title)),
            resource_id: Some(resource.id),
            ..NewLead::new(name, normalize_email(email), LeadSource::Download)
        };
        let lead = state.leads().create(lead).await?;
        info!(lead_id = lead.id, resource_id = resource.id, "gated download lead captured");
        deliver(
            state.mailer.as_ref(),
            lead_notification(&state.config, &lead),
            "lead notification",
        )
        .await;
    }

    resources.record_download(resource.id).await?;
    Ok(Json(DownloadView {
        file_url: resource.file_url,
    }))
}

/// GET /api/settings
pub async fn public_settings(
    State(state): State<AppState>,
) -> Result<Json<Map<String, Value>>, CmsError> {
    Ok(Json(state.settings().public_map().await?))
}
