use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use std::fmt::Write;

use crate::db::models::Lead;
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::JsonBody;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::types::admin::LeadStatusInput;
use crate::types::pagination::Paged;
use crate::types::query::LeadQuery;

/// GET /api/admin/leads
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

/// GET /api/admin/leads/{id}
pub async fn get_lead(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Lead>, CmsError> {
    current.require(Permission::LeadRead)?;
    state
        .leads()
        .get(id)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("lead"))
}

/// PATCH /api/admin/leads/{id}
pub async fn update_lead_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<LeadStatusInput>,
) -> Result<Json<Lead>, CmsError> {
    current.require(Permission::LeadManage)?;
    state
        .leads()
        .set_status(id, input.status)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("lead"))
}

/// DELETE /api/admin/leads/{id}
pub async fn delete_lead(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::LeadDelete)?;
    if !state.leads().delete(id).await? {
        return Err(CmsError::NotFound("lead"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/leads/export
pub async fn export_leads(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, CmsError> {
    current.require(Permission::LeadRead)?;
    let leads = state.leads().all().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"leads.csv\""),
        ],
        leads_csv(&leads),
    ))
}

const CSV_HEADER: [&str; 11] = [
    "id",
    "name",
    "email",
    "company",
    "phone",
    "service_interest",
    "source",
    "status",
    "message",
    "resource_id",
    "created_at",
];

fn enum_label<T: Serialize>(value: T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Leading characters a spreadsheet evaluates as a formula.
const FORMULA_PREFIXES: [char; 6] = ['=', '+', '-', '@', '\t', '\r'];

/// RFC 4180 field: quoted when it holds a delimiter, quote or line break.
/// Visitor text that would open a formula is prefixed with `'`.
fn csv_field(value: &str) -> String {
    let value = if value.starts_with(FORMULA_PREFIXES) {
        format!("'{value}")
    } else {
        value.to_string()
    };
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

pub fn leads_csv(leads: &[Lead]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");
    for lead in leads {
        let fields = [
            lead.id.to_string(),
            lead.name.clone(),
            lead.email.clone(),
            lead.company.clone().unwrap_or_default(),
            lead.phone.clone().unwrap_or_default(),
            lead.service_interest.clone().unwrap_or_default(),
            enum_label(lead.source),
            enum_label(lead.status),
            lead.message.clone().unwrap_or_default(),
            lead.resource_id.map(|id| id.to_string()).unwrap_or_default(),
            lead.created_at.to_rfc3339(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        let _ = write!(out, "{}\r\n", row.join(","));
    }
    out
}
