use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/reports", get(handlers::get_report))
        .route("/api/reports/job-seeker", get(handlers::get_job_seeker_report))
        .route("/api/reports/employer", get(handlers::get_employer_report))
        .route("/api/analytics/job-seeker", get(handlers::get_job_seeker_analytics))
        .route("/api/analytics/employer", get(handlers::get_employer_analytics))
        .route("/api/analytics/platform", get(handlers::get_platform_analytics))
        .with_state(state)
}
