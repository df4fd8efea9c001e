use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApplicationId, Approver, LeaveSubmission, ResidenceStatus, StaffRole, StudentId,
};
use super::queue::ApplicationFilter;
use super::repository::{LeaveRecord, LeaveRepository, NotificationPublisher, RepositoryError};
use super::service::{LeavePassService, LeaveServiceError, MovementRequest, SecurityLookup};

#[derive(Debug, Deserialize)]
pub(crate) struct ApproveRequest {
    pub(crate) approver: Approver,
    #[serde(default)]
    pub(crate) comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    pub(crate) approver: Approver,
    #[serde(default)]
    pub(crate) comments: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VerifyQuery {
    #[serde(default)]
    pub(crate) ic: Option<String>,
    #[serde(default)]
    pub(crate) application_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportRequest {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoutingQuery {
    pub(crate) residence: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecentLogsQuery {
    #[serde(default = "default_log_limit")]
    pub(crate) limit: usize,
}

fn default_log_limit() -> usize {
    10
}

/// Router builder exposing the leave-pass endpoints.
pub fn leave_router<R, N>(service: Arc<LeavePassService<R, N>>) -> Router
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/leave/applications", post(submit_handler::<R, N>))
        .route(
            "/api/v1/leave/applications/:application_id",
            get(status_handler::<R, N>),
        )
        .route(
            "/api/v1/leave/applications/:application_id/approve",
            post(approve_handler::<R, N>),
        )
        .route(
            "/api/v1/leave/applications/:application_id/reject",
            post(reject_handler::<R, N>),
        )
        .route("/api/v1/leave/queue/:role", get(queue_handler::<R, N>))
        .route(
            "/api/v1/leave/students/:student_id/applications",
            get(student_applications_handler::<R, N>),
        )
        .route("/api/v1/leave/security/verify", get(verify_handler::<R, N>))
        .route(
            "/api/v1/leave/security/logs",
            get(recent_logs_handler::<R, N>).post(log_movement_handler::<R, N>),
        )
        .route("/api/v1/leave/stats", get(stats_handler::<R, N>))
        .route("/api/v1/leave/stats/report", post(report_handler::<R, N>))
        .route("/api/v1/leave/routing", get(routing_handler::<R, N>))
        .with_state(service)
}

pub(crate) fn error_response(error: LeaveServiceError) -> Response {
    let status = match &error {
        LeaveServiceError::Intake(_)
        | LeaveServiceError::RejectionCommentRequired
        | LeaveServiceError::MissingApprover
        | LeaveServiceError::MissingOfficer => StatusCode::UNPROCESSABLE_ENTITY,
        LeaveServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        LeaveServiceError::Repository(RepositoryError::Conflict)
        | LeaveServiceError::AlreadyDecided { .. }
        | LeaveServiceError::UnexpectedMovement { .. } => StatusCode::CONFLICT,
        LeaveServiceError::MovementNotPermitted { .. } => StatusCode::FORBIDDEN,
        LeaveServiceError::Report(_) | LeaveServiceError::EmptyLookup => StatusCode::BAD_REQUEST,
        LeaveServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({ "error": message })),
    )
        .into_response()
}

fn views(records: Vec<LeaveRecord>) -> Response {
    let views: Vec<_> = records.iter().map(LeaveRecord::status_view).collect();
    (StatusCode::OK, axum::Json(views)).into_response()
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    axum::Json(submission): axum::Json<LeaveSubmission>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(submission, Utc::now()) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ApproveRequest>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.approve(&id, request.approver, request.comments, Utc::now()) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<RejectRequest>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.reject(&id, request.approver, &request.comments, Utc::now()) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    Path(role): Path<String>,
    Query(filter): Query<ApplicationFilter>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let Some(role) = StaffRole::parse(&role) else {
        return bad_request(format!("unknown staff role '{role}'"));
    };

    match service.pending_for(role, &filter) {
        Ok(records) => views(records),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn student_applications_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.applications_for_student(&StudentId(student_id)) {
        Ok(records) => views(records),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    Query(query): Query<VerifyQuery>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let lookup = match (query.application_id, query.ic) {
        (Some(id), _) if !id.trim().is_empty() => SecurityLookup::ApplicationId(ApplicationId(id)),
        (_, Some(ic)) => SecurityLookup::IcNumber(ic),
        _ => return error_response(LeaveServiceError::EmptyLookup),
    };

    match service.verify(&lookup) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn log_movement_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    axum::Json(request): axum::Json<MovementRequest>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.log_movement(request, Utc::now()) {
        Ok(entry) => (StatusCode::CREATED, axum::Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recent_logs_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    Query(query): Query<RecentLogsQuery>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.recent_logs(query.limit) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.stats(Utc::now()) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    axum::Json(request): axum::Json<ReportRequest>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.report(request.start, request.end) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn routing_handler<R, N>(
    State(service): State<Arc<LeavePassService<R, N>>>,
    Query(query): Query<RoutingQuery>,
) -> Response
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let Some(residence) = ResidenceStatus::parse(&query.residence) else {
        return bad_request(format!("unknown residence status '{}'", query.residence));
    };

    let preview = service.preview(residence, Utc::now());
    (StatusCode::OK, axum::Json(preview)).into_response()
}
