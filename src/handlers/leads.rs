use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::leads::NewLead;
use crate::db::models::{Lead, LeadSource};
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::rate_limit::{Bucket, ClientIp};
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::mailer::deliver;
use crate::service::notifications::{contact_acknowledgement, lead_notification};
use crate::service::rbac::Permission;
use crate::types::forms::{ContactInput, LeadInput, clean, normalize_email};
use crate::types::pagination::Paged;
use crate::types::query::LeadQuery;
use crate::types::views::Created;

/// POST /api/leads
pub async fn create_lead(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(input): ValidatedJson<LeadInput>,
) -> Result<(StatusCode, Json<Created>), CmsError> {
    state.limits.check(Bucket::Forms, ip)?;

    let lead = NewLead {
        company: clean(input.company),
        phone: clean(input.phone),
        message: clean(input.message),
        service_interest: clean(input.service_interest),
        ..NewLead::new(
            input.name.trim(),
            normalize_email(&input.email),
            input.source.unwrap_or(LeadSource::Other),
        )
    };
    let lead = state.leads().create(lead).await?;
    info!(lead_id = lead.id, source = ?lead.source, "lead captured");

    deliver(
        state.mailer.as_ref(),
        lead_notification(&state.config, &lead),
        "lead notification",
    )
    .await;

    Ok((StatusCode::CREATED, Json(Created { id: lead.id })))
}

/// GET /api/leads
pub async fn list_leads(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<LeadQuery>,
) -> Result<Json<Paged<Lead>>, CmsError> {
    current.require(Permission::LeadRead)?;
    let page = state
        .leads()
        .list(query.status, query.source, query.window())
        .await?;
    Ok(Json(page))
}

/// POST /api/contact
pub async fn contact(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(input): ValidatedJson<ContactInput>,
) -> Result<(StatusCode, Json<Created>), CmsError> {
    state.limits.check(Bucket::Forms, ip)?;

    let lead = NewLead {
        company: clean(input.company),
        phone: clean(input.phone),
        message: Some(input.message.trim().to_string()),
        service_interest: clean(input.service_interest),
        ..NewLead::new(
            input.name.trim(),
            normalize_email(&input.email),
            LeadSource::Contact,
        )
    };
    let lead = state.leads().create(lead).await?;
    info!(lead_id = lead.id, "contact form submitted");

    let mailer = state.mailer.as_ref();
    deliver(
        mailer,
        lead_notification(&state.config, &lead),
        "lead notification",
    )
    .await;
    deliver(mailer, contact_acknowledgement(&lead), "contact acknowledgement").await;

    Ok((StatusCode::CREATED, Json(Created { id: lead.id })))
}
