use crate::aggregate::{
    CategoryCount, TimeBucketCount, average_review_days, build_timeline, compute_success_rate,
    round_to,
};
use crate::models::UserId;
use crate::period::PeriodWindow;
use crate::query::{
    ActivityEntry, Aggregate, CategoryColumn, QueryResult, ReportQueries, Scope, Series,
    SignupBucket, TOP_JOBS_LIMIT,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DASHBOARD_DAYS: i64 = 30;
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerDashboard {
    pub application_stats: BTreeMap<String, u64>,
    pub application_timeline: Vec<TimeBucketCount>,
    pub recent_activity: Vec<ActivityEntry>,
    pub total_applications: u64,
    pub accepted_applications: u64,
    pub success_rate: f64,
    pub average_response_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerDashboard {
    pub job_stats: BTreeMap<String, u64>,
    pub applications_received: Vec<TimeBucketCount>,
    pub job_views_data: Vec<TimeBucketCount>,
    pub top_jobs: Vec<DashboardJob>,
    pub application_status_breakdown: BTreeMap<String, u64>,
    pub recent_activity: Vec<ActivityEntry>,
    pub total_views: u64,
    pub total_applications_received: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardJob {
    pub id: u64,
    pub title: String,
    pub application_count: u64,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDashboard {
    pub user_growth: Vec<SignupBucket>,
    pub job_posting_trends: Vec<TimeBucketCount>,
    pub total_users: u64,
    pub total_jobs: u64,
    pub total_applications: u64,
    pub total_companies: u64,
}

fn dashboard_window(now: DateTime<Utc>) -> Option<PeriodWindow> {
    PeriodWindow::trailing_days(now, DASHBOARD_DAYS)
}

fn as_map(rows: Vec<CategoryCount>) -> BTreeMap<String, u64> {
    rows.into_iter()
        .map(|row| (row.category, row.count))
        .collect()
}

pub fn build_job_seeker_dashboard<Q>(
    queries: &Q,
    user_id: UserId,
    now: DateTime<Utc>,
) -> QueryResult<JobSeekerDashboard>
where
    Q: ReportQueries + ?Sized,
{
    let scope = Scope::Applicant(user_id);
    let window = dashboard_window(now);

    let application_stats =
        as_map(queries.category_counts(scope, CategoryColumn::ApplicationStatus, None)?);
    let application_timeline =
        build_timeline(queries.time_bucket_counts(scope, Series::Applications, window.as_ref())?);
    let recent_activity = queries.recent_activity(user_id, RECENT_ACTIVITY_LIMIT)?;
    let total_applications = queries.scalar_aggregate(scope, Aggregate::Applications, None)?;
    let accepted_applications =
        queries.scalar_aggregate(scope, Aggregate::AcceptedApplications, None)?;
    let reviewed = queries.review_intervals(scope, false, None)?;

    Ok(JobSeekerDashboard {
        application_stats,
        application_timeline,
        recent_activity,
        total_applications,
        accepted_applications,
        success_rate: compute_success_rate(total_applications, accepted_applications),
        average_response_time: average_review_days(&reviewed).round() as i64,
    })
}

pub fn build_employer_dashboard<Q>(
    queries: &Q,
    user_id: UserId,
    now: DateTime<Utc>,
) -> QueryResult<EmployerDashboard>
where
    Q: ReportQueries + ?Sized,
{
    let scope = Scope::Employer(user_id);
    let window = dashboard_window(now);

    let total_views = queries.scalar_aggregate(scope, Aggregate::JobViewCounters, None)?;
    let total_applications_received =
        queries.scalar_aggregate(scope, Aggregate::JobApplicationCounters, None)?;
    let conversion_rate = round_to(
        compute_success_rate(total_views, total_applications_received),
        2,
    );

    Ok(EmployerDashboard {
        job_stats: as_map(queries.category_counts(scope, CategoryColumn::JobStatus, None)?),
        applications_received: build_timeline(queries.time_bucket_counts(
            scope,
            Series::Applications,
            window.as_ref(),
        )?),
        job_views_data: build_timeline(queries.time_bucket_counts(
            scope,
            Series::JobViews,
            window.as_ref(),
        )?),
        top_jobs: queries
            .top_jobs(scope, None, TOP_JOBS_LIMIT)?
            .into_iter()
            .map(|job| DashboardJob {
                id: job.id,
                title: job.title,
                application_count: job.application_count,
                view_count: job.view_count,
                created_at: job.created_at,
            })
            .collect(),
        application_status_breakdown: as_map(queries.category_counts(
            scope,
            CategoryColumn::ApplicationStatus,
            None,
        )?),
        recent_activity: queries.recent_activity(user_id, RECENT_ACTIVITY_LIMIT)?,
        total_views,
        total_applications_received,
        conversion_rate,
    })
}

pub fn build_platform_dashboard<Q>(
    queries: &Q,
    now: DateTime<Utc>,
) -> QueryResult<PlatformDashboard>
where
    Q: ReportQueries + ?Sized,
{
    let window = dashboard_window(now);
    let total = |aggregate| queries.scalar_aggregate(Scope::Platform, aggregate, None);

    Ok(PlatformDashboard {
        user_growth: queries.user_signups(window.as_ref())?,
        job_posting_trends: build_timeline(queries.time_bucket_counts(
            Scope::Platform,
            Series::JobsPosted,
            window.as_ref(),
        )?),
        total_users: total(Aggregate::Users)?,
        total_jobs: total(Aggregate::JobsPosted)?,
        total_applications: total(Aggregate::Applications)?,
        total_companies: total(Aggregate::Companies)?,
    })
}
