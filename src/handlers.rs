use crate::analytics::{
    EmployerDashboard, JobSeekerDashboard, PlatformDashboard, build_employer_dashboard,
    build_job_seeker_dashboard, build_platform_dashboard,
};
use crate::auth::{Caller, resolve_caller};
use crate::errors::AppError;
use crate::models::Role;
use crate::period::{Periods, resolve_range};
use crate::query::ReportQueries;
use crate::reports::{
    EmployerReport, JobSeekerReport, Report, build_employer_report, build_job_seeker_report,
};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

const REPORTS_FAILED: &str = "Failed to fetch reports data";
const ANALYTICS_FAILED: &str = "Failed to fetch analytics data";

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub range: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Json<Report>, AppError> {
    let caller = resolve_caller(&headers, &*state.data)?;
    let periods = periods_for(&state, &params)?;

    let report = match caller.role {
        Role::JobSeeker => Report::JobSeeker(job_seeker_report(&*state.data, caller, &periods)?),
        Role::Employer => Report::Employer(employer_report(&*state.data, caller, &periods)?),
        Role::Admin => {
            return Err(AppError::forbidden(
                "Unauthorized - job seekers and employers only",
            ));
        }
    };

    Ok(Json(report))
}

pub async fn get_job_seeker_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Json<JobSeekerReport>, AppError> {
    let caller = resolve_caller(&headers, &*state.data)?.require(Role::JobSeeker)?;
    let periods = periods_for(&state, &params)?;
    Ok(Json(job_seeker_report(&*state.data, caller, &periods)?))
}

pub async fn get_employer_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Json<EmployerReport>, AppError> {
    let caller = resolve_caller(&headers, &*state.data)?.require(Role::Employer)?;
    let periods = periods_for(&state, &params)?;
    Ok(Json(employer_report(&*state.data, caller, &periods)?))
}

pub async fn get_job_seeker_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<JobSeekerDashboard>, AppError> {
    let caller = resolve_caller(&headers, &*state.data)?.require(Role::JobSeeker)?;
    let dashboard = build_job_seeker_dashboard(&*state.data, caller.user_id, Utc::now())
        .map_err(|err| AppError::internal(ANALYTICS_FAILED, err))?;
    Ok(Json(dashboard))
}

pub async fn get_employer_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EmployerDashboard>, AppError> {
    let caller = resolve_caller(&headers, &*state.data)?.require(Role::Employer)?;
    let dashboard = build_employer_dashboard(&*state.data, caller.user_id, Utc::now())
        .map_err(|err| AppError::internal(ANALYTICS_FAILED, err))?;
    Ok(Json(dashboard))
}

pub async fn get_platform_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlatformDashboard>, AppError> {
    resolve_caller(&headers, &*state.data)?.require(Role::Admin)?;
    let dashboard = build_platform_dashboard(&*state.data, Utc::now())
        .map_err(|err| AppError::internal(ANALYTICS_FAILED, err))?;
    Ok(Json(dashboard))
}

fn periods_for(state: &AppState, params: &ReportParams) -> Result<Periods, AppError> {
    let (token, periods) = resolve_range(params.range.as_deref(), state.range_policy, Utc::now())?;
    debug!(range = %token, "resolved report range");
    Ok(periods)
}

fn job_seeker_report<Q>(
    queries: &Q,
    caller: Caller,
    periods: &Periods,
) -> Result<JobSeekerReport, AppError>
where
    Q: ReportQueries + ?Sized,
{
    build_job_seeker_report(queries, caller.user_id, periods)
        .map_err(|err| AppError::internal(REPORTS_FAILED, err))
}

fn employer_report<Q>(
    queries: &Q,
    caller: Caller,
    periods: &Periods,
) -> Result<EmployerReport, AppError>
where
    Q: ReportQueries + ?Sized,
{
    build_employer_report(queries, caller.user_id, periods)
        .map_err(|err| AppError::internal(REPORTS_FAILED, err))
}
