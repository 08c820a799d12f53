use crate::aggregate::{CategoryCount, ReviewInterval, TimeBucketCount};
use crate::models::{
    ActivityLogRecord, ApplicationRecord, Dataset, JobId, JobRecord, Role, UserId,
};
use crate::period::PeriodWindow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

pub const ACCEPTED_STATUS: &str = "accepted";
pub const TOP_JOBS_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query backend unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Failed(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Applicant(UserId),
    Employer(UserId),
    Platform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Applications,
    JobViews,
    JobsPosted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryColumn {
    ApplicationStatus,
    JobStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Applications,
    AcceptedApplications,
    JobsPosted,
    /// Sum of the per-job view counters, windowed on job creation.
    JobViewCounters,
    /// Sum of the per-job application counters, windowed on job creation.
    JobApplicationCounters,
    Users,
    Companies,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPerformance {
    pub id: JobId,
    pub title: String,
    pub application_count: u64,
    pub view_count: u64,
    pub accepted_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub id: u64,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupBucket {
    pub date: NaiveDate,
    pub job_seekers: u64,
    pub employers: u64,
}

pub trait ReportQueries {
    /// Per-day counts; order unspecified, days without events absent.
    fn time_bucket_counts(
        &self,
        scope: Scope,
        series: Series,
        window: Option<&PeriodWindow>,
    ) -> QueryResult<Vec<TimeBucketCount>>;

    fn category_counts(
        &self,
        scope: Scope,
        column: CategoryColumn,
        window: Option<&PeriodWindow>,
    ) -> QueryResult<Vec<CategoryCount>>;

    fn scalar_aggregate(
        &self,
        scope: Scope,
        aggregate: Aggregate,
        window: Option<&PeriodWindow>,
    ) -> QueryResult<u64>;

    fn review_intervals(
        &self,
        scope: Scope,
        accepted_only: bool,
        window: Option<&PeriodWindow>,
    ) -> QueryResult<Vec<ReviewInterval>>;

    /// Jobs by descending application counter.
    fn top_jobs(
        &self,
        scope: Scope,
        window: Option<&PeriodWindow>,
        limit: usize,
    ) -> QueryResult<Vec<JobPerformance>>;

    /// Newest first.
    fn recent_activity(&self, user_id: UserId, limit: usize) -> QueryResult<Vec<ActivityEntry>>;

    fn user_signups(&self, window: Option<&PeriodWindow>) -> QueryResult<Vec<SignupBucket>>;

    fn user_role(&self, user_id: UserId) -> QueryResult<Option<Role>>;
}

fn in_window(window: Option<&PeriodWindow>, instant: DateTime<Utc>) -> bool {
    window.is_none_or(|window| window.contains(instant))
}

fn bucket_by_day(instants: impl Iterator<Item = DateTime<Utc>>) -> Vec<TimeBucketCount> {
    let mut days: HashMap<NaiveDate, u64> = HashMap::new();
    for instant in instants {
        *days.entry(instant.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, count)| TimeBucketCount { date, count })
        .collect()
}

impl Dataset {
    fn job_ids_posted_by(&self, user_id: UserId) -> HashSet<JobId> {
        self.jobs
            .iter()
            .filter(|job| job.created_by_id == user_id)
            .map(|job| job.id)
            .collect()
    }

    fn scoped_applications(&self, scope: Scope) -> Vec<&ApplicationRecord> {
        match scope {
            Scope::Applicant(user_id) => self
                .applications
                .iter()
                .filter(|application| application.user_id == user_id)
                .collect(),
            Scope::Employer(user_id) => {
                let jobs = self.job_ids_posted_by(user_id);
                self.applications
                    .iter()
                    .filter(|application| jobs.contains(&application.job_id))
                    .collect()
            }
            Scope::Platform => self.applications.iter().collect(),
        }
    }

    fn scoped_jobs(&self, scope: Scope) -> Vec<&JobRecord> {
        match scope {
            Scope::Applicant(_) => Vec::new(),
            Scope::Employer(user_id) => self
                .jobs
                .iter()
                .filter(|job| job.created_by_id == user_id)
                .collect(),
            Scope::Platform => self.jobs.iter().collect(),
        }
    }

    fn scoped_view_times(&self, scope: Scope) -> Vec<DateTime<Utc>> {
        match scope {
            Scope::Applicant(user_id) => self
                .job_views
                .iter()
                .filter(|view| view.user_id == Some(user_id))
                .map(|view| view.viewed_at)
                .collect(),
            Scope::Employer(user_id) => {
                let jobs = self.job_ids_posted_by(user_id);
                self.job_views
                    .iter()
                    .filter(|view| jobs.contains(&view.job_id))
                    .map(|view| view.viewed_at)
                    .collect()
            }
            Scope::Platform => self.job_views.iter().map(|view| view.viewed_at).collect(),
        }
    }
}

impl ReportQueries for Dataset {
    fn time_bucket_counts(
        &self,
        scope: Scope,
        series: Series,
        window: Option<&PeriodWindow>,
    ) -> QueryResult<Vec<TimeBucketCount>> {
        let instants: Vec<DateTime<Utc>> = match series {
            Series::Applications => self
                .scoped_applications(scope)
                .into_iter()
                .map(|application| application.applied_at)
                .collect(),
            Series::JobViews => self.scoped_view_times(scope),
            Series::JobsPosted => self
                .scoped_jobs(scope)
                .into_iter()
                .map(|job| job.created_at)
                .collect(),
        };

        Ok(bucket_by_day(
            instants.into_iter().filter(|instant| in_window(window, *instant)),
        ))
    }

    fn category_counts(
        &self,
        scope: Scope,
        column: CategoryColumn,
        window: Option<&PeriodWindow>,
    ) -> QueryResult<Vec<CategoryCount>> {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        match column {
            CategoryColumn::ApplicationStatus => {
                for application in self.scoped_applications(scope) {
                    if in_window(window, application.applied_at) {
                        *counts.entry(application.status.as_str()).or_default() += 1;
                    }
                }
            }
            CategoryColumn::JobStatus => {
                for job in self.scoped_jobs(scope) {
                    if in_window(window, job.created_at) {
                        *counts.entry(job.status.as_str()).or_default() += 1;
                    }
                }
            }
        }

        Ok(counts
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect())
    }

    fn scalar_aggregate(
        &self,
        scope: Scope,
        aggregate: Aggregate,
        window: Option<&PeriodWindow>,
    ) -> QueryResult<u64> {
        let jobs_in_window = || {
            self.scoped_jobs(scope)
                .into_iter()
                .filter(move |job| in_window(window, job.created_at))
        };

        let total = match aggregate {
            Aggregate::Applications => self
                .scoped_applications(scope)
                .into_iter()
                .filter(|application| in_window(window, application.applied_at))
                .count() as u64,
            Aggregate::AcceptedApplications => self
                .scoped_applications(scope)
                .into_iter()
                .filter(|application| {
                    application.status == ACCEPTED_STATUS
                        && in_window(window, application.applied_at)
                })
                .count() as u64,
            Aggregate::JobsPosted => jobs_in_window().count() as u64,
            Aggregate::JobViewCounters => jobs_in_window()
                .fold(0u64, |sum, job| sum.saturating_add(job.view_count)),
            Aggregate::JobApplicationCounters => jobs_in_window()
                .fold(0u64, |sum, job| sum.saturating_add(job.application_count)),
            Aggregate::Users => self
                .users
                .iter()
                .filter(|user| in_window(window, user.created_at))
                .count() as u64,
            Aggregate::Companies => self
                .companies
                .iter()
                .filter(|company| in_window(window, company.created_at))
                .count() as u64,
        };

        Ok(total)
    }

    fn review_intervals(
        &self,
        scope: Scope,
        accepted_only: bool,
        window: Option<&PeriodWindow>,
    ) -> QueryResult<Vec<ReviewInterval>> {
        Ok(self
            .scoped_applications(scope)
            .into_iter()
            .filter(|application| !accepted_only || application.status == ACCEPTED_STATUS)
            .filter(|application| in_window(window, application.applied_at))
            .filter_map(|application| {
                application.reviewed_at.map(|reviewed_at| ReviewInterval {
                    applied_at: application.applied_at,
                    reviewed_at,
                })
            })
            .collect())
    }

    fn top_jobs(
        &self,
        scope: Scope,
        window: Option<&PeriodWindow>,
        limit: usize,
    ) -> QueryResult<Vec<JobPerformance>> {
        let mut accepted: HashMap<JobId, u64> = HashMap::new();
        for application in &self.applications {
            if application.status == ACCEPTED_STATUS {
                *accepted.entry(application.job_id).or_default() += 1;
            }
        }

        let mut jobs: Vec<&JobRecord> = self
            .scoped_jobs(scope)
            .into_iter()
            .filter(|job| in_window(window, job.created_at))
            .collect();
        jobs.sort_by(|a, b| {
            b.application_count
                .cmp(&a.application_count)
                .then(a.id.cmp(&b.id))
        });

        Ok(jobs
            .into_iter()
            .take(limit)
            .map(|job| JobPerformance {
                id: job.id,
                title: job.title.clone(),
                application_count: job.application_count,
                view_count: job.view_count,
                accepted_count: accepted.get(&job.id).copied().unwrap_or_default(),
                created_at: job.created_at,
            })
            .collect())
    }

    fn recent_activity(&self, user_id: UserId, limit: usize) -> QueryResult<Vec<ActivityEntry>> {
        let mut entries: Vec<&ActivityLogRecord> = self
            .activity_logs
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(entries
            .into_iter()
            .take(limit)
            .map(|entry| ActivityEntry {
                id: entry.id,
                action: entry.action.clone(),
                timestamp: entry.timestamp,
                metadata: entry.metadata.clone(),
            })
            .collect())
    }

    fn user_signups(&self, window: Option<&PeriodWindow>) -> QueryResult<Vec<SignupBucket>> {
        let mut days: BTreeMap<NaiveDate, SignupBucket> = BTreeMap::new();
        for user in self.users.iter().filter(|user| in_window(window, user.created_at)) {
            let date = user.created_at.date_naive();
            let bucket = days.entry(date).or_insert(SignupBucket {
                date,
                job_seekers: 0,
                employers: 0,
            });
            match user.role {
                Role::JobSeeker => bucket.job_seekers += 1,
                Role::Employer => bucket.employers += 1,
                Role::Admin => {}
            }
        }
        Ok(days.into_values().collect())
    }

    fn user_role(&self, user_id: UserId) -> QueryResult<Option<Role>> {
        Ok(self
            .users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobViewRecord, UserRecord};
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn job(
        id: JobId,
        owner: UserId,
        status: &str,
        applications: u64,
        created: DateTime<Utc>,
    ) -> JobRecord {
        JobRecord {
            id,
            title: format!("Job {id}"),
            company_id: None,
            status: status.to_string(),
            created_by_id: owner,
            view_count: applications * 10,
            application_count: applications,
            created_at: created,
        }
    }

    fn application(
        id: u64,
        job_id: JobId,
        user_id: UserId,
        status: &str,
        applied: DateTime<Utc>,
    ) -> ApplicationRecord {
        ApplicationRecord {
            id,
            job_id,
            user_id,
            status: status.to_string(),
            applied_at: applied,
            reviewed_at: None,
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            users: vec![
                UserRecord { id: 1, name: None, role: Role::JobSeeker, created_at: at(1, 8) },
                UserRecord { id: 2, name: None, role: Role::Employer, created_at: at(1, 9) },
                UserRecord { id: 3, name: None, role: Role::JobSeeker, created_at: at(2, 9) },
            ],
            jobs: vec![
                job(10, 2, "active", 3, at(1, 10)),
                job(11, 2, "closed", 7, at(3, 10)),
                job(12, 99, "active", 1, at(3, 10)),
            ],
            applications: vec![
                application(1, 10, 1, "pending", at(4, 9)),
                application(2, 11, 1, "accepted", at(4, 18)),
                application(3, 11, 3, "accepted", at(5, 9)),
                application(4, 12, 1, "rejected", at(6, 9)),
            ],
            job_views: vec![
                JobViewRecord { id: 1, job_id: 10, user_id: Some(1), viewed_at: at(4, 8) },
                JobViewRecord { id: 2, job_id: 12, user_id: None, viewed_at: at(4, 8) },
            ],
            ..Dataset::default()
        }
    }

    #[test]
    fn buckets_applications_by_calendar_day() {
        let data = dataset();
        let mut rows = data
            .time_bucket_counts(Scope::Applicant(1), Series::Applications, None)
            .unwrap();
        rows.sort_by_key(|row| row.date);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, at(4, 0).date_naive());
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].count, 1);
    }

    #[test]
    fn employer_scope_joins_through_posted_jobs() {
        let data = dataset();
        let total = data
            .scalar_aggregate(Scope::Employer(2), Aggregate::Applications, None)
            .unwrap();
        assert_eq!(total, 3);

        let accepted = data
            .scalar_aggregate(Scope::Employer(2), Aggregate::AcceptedApplications, None)
            .unwrap();
        assert_eq!(accepted, 2);

        let views = data
            .time_bucket_counts(Scope::Employer(2), Series::JobViews, None)
            .unwrap();
        assert_eq!(views.iter().map(|row| row.count).sum::<u64>(), 1);
    }

    #[test]
    fn window_filter_is_half_open() {
        let data = dataset();
        let window = PeriodWindow::new(at(4, 9), at(5, 9)).unwrap();
        let total = data
            .scalar_aggregate(Scope::Platform, Aggregate::Applications, Some(&window))
            .unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn category_counts_only_report_observed_values() {
        let data = dataset();
        let rows = data
            .category_counts(Scope::Applicant(1), CategoryColumn::ApplicationStatus, None)
            .unwrap();
        let categories: Vec<_> = rows.iter().map(|row| row.category.as_str()).collect();
        assert_eq!(categories, vec!["accepted", "pending", "rejected"]);

        let jobs = data
            .category_counts(Scope::Employer(2), CategoryColumn::JobStatus, None)
            .unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn counter_sums_window_on_job_creation() {
        let data = dataset();
        let window = PeriodWindow::new(at(2, 0), at(4, 0)).unwrap();
        let views = data
            .scalar_aggregate(Scope::Employer(2), Aggregate::JobViewCounters, Some(&window))
            .unwrap();
        assert_eq!(views, 70);

        let posted = data
            .scalar_aggregate(Scope::Employer(2), Aggregate::JobsPosted, None)
            .unwrap();
        assert_eq!(posted, 2);
    }

    #[test]
    fn top_jobs_order_by_application_counter() {
        let data = dataset();
        let top = data.top_jobs(Scope::Employer(2), None, 5).unwrap();
        let ids: Vec<_> = top.iter().map(|job| job.id).collect();
        assert_eq!(ids, vec![11, 10]);
        assert_eq!(top[0].accepted_count, 2);
    }

    #[test]
    fn review_intervals_skip_unreviewed() {
        let mut data = dataset();
        data.applications[1].reviewed_at = Some(at(4, 18) + Duration::days(3));
        let intervals = data
            .review_intervals(Scope::Applicant(1), false, None)
            .unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].days(), 3);
    }

    #[test]
    fn signups_split_by_role() {
        let data = dataset();
        let buckets = data.user_signups(None).unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!((buckets[0].job_seekers, buckets[0].employers), (1, 1));
        assert_eq!((buckets[1].job_seekers, buckets[1].employers), (1, 0));
    }

    #[test]
    fn resolves_roles() {
        let data = dataset();
        assert_eq!(data.user_role(2).unwrap(), Some(Role::Employer));
        assert_eq!(data.user_role(42).unwrap(), None);
    }
}
