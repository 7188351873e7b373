use axum::{extract::{Path, Query, State}, http::{header, StatusCode}, response::IntoResponse, Json};

use common::types::ActionResult;
use models::{errors::FieldIssue, reference::ReferenceData, Report, ReportInput, APPLICATION_DATE, INSPECTION_DATE};
use service::reports::{dates, export::export_rows, ActionOutcome, FailureKind, ReportFilter};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

fn date_issues(input: &ReportInput) -> Vec<FieldIssue> {
    [APPLICATION_DATE, INSPECTION_DATE]
        .into_iter()
        .filter_map(|field| match input.date(field) {
            None if !input.body.contains_key(field) => Some(FieldIssue::new(field, "Date is required.")),
            Some(date) if dates::parse_date(&date).is_some() => None,
            _ => Some(FieldIssue::new(field, "Invalid date.")),
        })
        .collect()
}

fn status_of(outcome: &ActionOutcome, success: StatusCode) -> StatusCode {
    match outcome.failure {
        None => success,
        Some(FailureKind::Invalid) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(FailureKind::NotFound) => StatusCode::NOT_FOUND,
        Some(FailureKind::Storage) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 表单下拉选项与字段联动规则
#[utoipa::path(get, path = "/api/reference", tag = "reports", responses((status = 200, description = "Offices, service types, units and currencies")))]
pub async fn reference() -> Json<ReferenceData> {
    Json(ReferenceData::build())
}

/// 提交报告：先按服务类型规则校验，再写入存储
#[utoipa::path(post, path = "/api/reports", tag = "reports", request_body = crate::openapi::ReportInputDoc, responses((status = 201, description = "Report stored"), (status = 422, description = "Validation Error"), (status = 500, description = "Report could not be stored")))]
pub async fn submit_report(
    State(state): State<ServerState>,
    Json(input): Json<ReportInput>,
) -> Result<(StatusCode, Json<ActionResult>), JsonApiError> {
    let mut issues = date_issues(&input);
    let input = match input.prepare() {
        Ok(input) if issues.is_empty() => input,
        Ok(_) => return Err(JsonApiError::unprocessable(issues)),
        Err(e) => {
            issues.extend(e.issues());
            return Err(JsonApiError::unprocessable(issues));
        }
    };
    let outcome = state.reports.submit_report(input).await;
    Ok((status_of(&outcome, StatusCode::CREATED), Json(outcome.result)))
}

/// 列出报告（最新在前），支持 search / regionalOffice / serviceType 过滤
#[utoipa::path(get, path = "/admin/reports", tag = "admin", params(
    ("search" = Option<String>, Query, description = "Case-insensitive text search"),
    ("regionalOffice" = Option<String>, Query, description = "Exact regional office or `all`"),
    ("serviceType" = Option<String>, Query, description = "Exact service type or `all`"),
), responses((status = 200, description = "Reports, newest first"), (status = 401, description = "Unauthorized")))]
pub async fn list_reports(
    State(state): State<ServerState>,
    Query(filter): Query<ReportFilter>,
) -> Json<Vec<Report>> {
    Json(filter.apply(state.reports.get_reports().await))
}

#[utoipa::path(get, path = "/admin/reports/export", tag = "admin", params(
    ("search" = Option<String>, Query, description = "Case-insensitive text search"),
    ("regionalOffice" = Option<String>, Query, description = "Exact regional office or `all`"),
    ("serviceType" = Option<String>, Query, description = "Exact service type or `all`"),
), responses((status = 200, description = "One row per commodity"), (status = 401, description = "Unauthorized")))]
pub async fn export_reports(
    State(state): State<ServerState>,
    Query(filter): Query<ReportFilter>,
) -> impl IntoResponse {
    let reports = filter.apply(state.reports.get_reports().await);
    (
        [(header::CONTENT_DISPOSITION, "attachment; filename=\"reports.json\"")],
        Json(export_rows(&reports)),
    )
}

#[utoipa::path(delete, path = "/admin/reports/{id}", tag = "admin", params(
    ("id" = String, Path, description = "Report id, e.g. RPT-001"),
), responses((status = 200, description = "Deleted"), (status = 404, description = "No report with this id"), (status = 500, description = "Snapshot could not be read or written"), (status = 401, description = "Unauthorized")))]
pub async fn delete_report(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ActionResult>) {
    let outcome = state.reports.delete_report(&id).await;
    (status_of(&outcome, StatusCode::OK), Json(outcome.result))
}
