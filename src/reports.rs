use crate::aggregate::{
    CategorySlice, ComparisonResult, Metric, PeriodMetrics, TimeBucketCount, TimelinePoint,
    TrendProjection, average_review_days, build_category_breakdown, build_timeline, compare,
    compute_success_rate, compute_totals, merge_timelines, project_trend, round_to,
};
use crate::models::UserId;
use crate::period::{PeriodWindow, Periods};
use crate::query::{
    Aggregate, CategoryColumn, QueryResult, ReportQueries, Scope, Series, TOP_JOBS_LIMIT,
};
use serde::Serialize;

pub const JOB_SEEKER_CONFIDENCE: u8 = 75;
pub const EMPLOYER_CONFIDENCE: u8 = 80;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerReport {
    pub timeline: Vec<TimelinePoint>,
    pub comparison: ComparisonResult,
    pub category_breakdown: Vec<CategorySlice>,
    pub predictive_analytics: TrendProjection,
    pub detailed_metrics: JobSeekerDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerDetails {
    pub candidate_engagement: CandidateEngagement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEngagement {
    pub profile_views: Metric<u64>,
    pub messages_sent: Metric<u64>,
    pub response_rate: Metric<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerReport {
    pub timeline: Vec<TimelinePoint>,
    pub comparison: ComparisonResult,
    pub category_breakdown: Vec<CategorySlice>,
    pub predictive_analytics: TrendProjection,
    pub detailed_metrics: EmployerDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerDetails {
    pub average_time_to_hire: i64,
    pub top_performing_jobs: Vec<TopJob>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopJob {
    pub title: String,
    pub applications: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    JobSeeker(JobSeekerReport),
    Employer(EmployerReport),
}

pub fn build_job_seeker_report<Q>(
    queries: &Q,
    user_id: UserId,
    periods: &Periods,
) -> QueryResult<JobSeekerReport>
where
    Q: ReportQueries + ?Sized,
{
    let scope = Scope::Applicant(user_id);

    let timeline = build_timeline(queries.time_bucket_counts(
        scope,
        Series::Applications,
        Some(&periods.current),
    )?);
    let current = applicant_metrics(queries, scope, &periods.current, &timeline)?;

    let previous_rows =
        queries.time_bucket_counts(scope, Series::Applications, Some(&periods.previous))?;
    let previous = applicant_metrics(queries, scope, &periods.previous, &previous_rows)?;

    let categories =
        queries.category_counts(scope, CategoryColumn::ApplicationStatus, Some(&periods.current))?;

    Ok(JobSeekerReport {
        timeline: timeline
            .iter()
            .map(|row| TimelinePoint {
                date: row.date,
                applications: row.count,
                views: 0,
            })
            .collect(),
        comparison: compare(current, previous),
        category_breakdown: build_category_breakdown(&categories),
        predictive_analytics: project_trend(
            &timeline,
            Metric::Estimated(JOB_SEEKER_CONFIDENCE),
        ),
        detailed_metrics: JobSeekerDetails {
            candidate_engagement: CandidateEngagement {
                profile_views: Metric::Unavailable,
                messages_sent: Metric::Unavailable,
                response_rate: Metric::Unavailable,
            },
        },
    })
}

fn applicant_metrics<Q>(
    queries: &Q,
    scope: Scope,
    window: &PeriodWindow,
    rows: &[TimeBucketCount],
) -> QueryResult<PeriodMetrics>
where
    Q: ReportQueries + ?Sized,
{
    let applications = compute_totals(rows);
    let accepted = queries.scalar_aggregate(scope, Aggregate::AcceptedApplications, Some(window))?;

    Ok(PeriodMetrics {
        applications,
        views: 0,
        jobs_posted: None,
        success_rate: compute_success_rate(applications, accepted),
    })
}

pub fn build_employer_report<Q>(
    queries: &Q,
    user_id: UserId,
    periods: &Periods,
) -> QueryResult<EmployerReport>
where
    Q: ReportQueries + ?Sized,
{
    let scope = Scope::Employer(user_id);
    let current_window = Some(&periods.current);

    let applications = queries.time_bucket_counts(scope, Series::Applications, current_window)?;
    let applications = build_timeline(applications);
    let views = queries.time_bucket_counts(scope, Series::JobViews, current_window)?;
    let views = build_timeline(views);

    let current = employer_metrics(queries, scope, &periods.current, &applications)?;
    let previous_rows =
        queries.time_bucket_counts(scope, Series::Applications, Some(&periods.previous))?;
    let previous = employer_metrics(queries, scope, &periods.previous, &previous_rows)?;

    let categories =
        queries.category_counts(scope, CategoryColumn::ApplicationStatus, current_window)?;
    let hires = queries.review_intervals(scope, true, current_window)?;
    let top_jobs = queries
        .top_jobs(scope, current_window, TOP_JOBS_LIMIT)?
        .into_iter()
        .map(|job| TopJob {
            success_rate: round_to(
                compute_success_rate(job.application_count, job.accepted_count),
                1,
            ),
            title: job.title,
            applications: job.application_count,
        })
        .collect();

    Ok(EmployerReport {
        timeline: merge_timelines(&applications, &views),
        comparison: compare(current, previous),
        category_breakdown: build_category_breakdown(&categories),
        predictive_analytics: project_trend(
            &applications,
            Metric::Estimated(EMPLOYER_CONFIDENCE),
        ),
        detailed_metrics: EmployerDetails {
            average_time_to_hire: average_review_days(&hires).round() as i64,
            top_performing_jobs: top_jobs,
        },
    })
}

fn employer_metrics<Q>(
    queries: &Q,
    scope: Scope,
    window: &PeriodWindow,
    rows: &[TimeBucketCount],
) -> QueryResult<PeriodMetrics>
where
    Q: ReportQueries + ?Sized,
{
    let applications = compute_totals(rows);
    let accepted = queries.scalar_aggregate(scope, Aggregate::AcceptedApplications, Some(window))?;
    let views = queries.scalar_aggregate(scope, Aggregate::JobViewCounters, Some(window))?;
    let jobs_posted = queries.scalar_aggregate(scope, Aggregate::JobsPosted, Some(window))?;

    Ok(PeriodMetrics {
        applications,
        views,
        jobs_posted: Some(jobs_posted),
        success_rate: compute_success_rate(applications, accepted),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{CategoryCount, ReviewInterval, TrendDirection};
    use crate::models::Role;
    use crate::period::RangeToken;
    use crate::query::{ActivityEntry, JobPerformance, QueryError, SignupBucket};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    // Rows are picked by whether the current window is asked for.
    #[derive(Default)]
    struct CannedQueries {
        periods: Option<Periods>,
        current_applications: Vec<TimeBucketCount>,
        previous_applications: Vec<TimeBucketCount>,
        current_views: Vec<TimeBucketCount>,
        accepted: (u64, u64),
        view_counters: (u64, u64),
        jobs_posted: (u64, u64),
        categories: Vec<CategoryCount>,
        hires: Vec<ReviewInterval>,
        top: Vec<JobPerformance>,
        fail: bool,
    }

    impl CannedQueries {
        fn is_current(&self, window: Option<&PeriodWindow>) -> bool {
            match (self.periods, window) {
                (Some(periods), Some(window)) => *window == periods.current,
                _ => true,
            }
        }

        fn pick(&self, pair: (u64, u64), window: Option<&PeriodWindow>) -> u64 {
            if self.is_current(window) { pair.0 } else { pair.1 }
        }

        fn check(&self) -> QueryResult<()> {
            if self.fail {
                return Err(QueryError::Unavailable("connection refused".into()));
            }
            Ok(())
        }
    }

    impl ReportQueries for CannedQueries {
        fn time_bucket_counts(
            &self,
            _scope: Scope,
            series: Series,
            window: Option<&PeriodWindow>,
        ) -> QueryResult<Vec<TimeBucketCount>> {
            self.check()?;
            Ok(match (series, self.is_current(window)) {
                (Series::Applications, true) => self.current_applications.clone(),
                (Series::Applications, false) => self.previous_applications.clone(),
                (Series::JobViews, true) => self.current_views.clone(),
                _ => Vec::new(),
            })
        }

        fn category_counts(
            &self,
            _scope: Scope,
            _column: CategoryColumn,
            _window: Option<&PeriodWindow>,
        ) -> QueryResult<Vec<CategoryCount>> {
            self.check()?;
            Ok(self.categories.clone())
        }

        fn scalar_aggregate(
            &self,
            _scope: Scope,
            aggregate: Aggregate,
            window: Option<&PeriodWindow>,
        ) -> QueryResult<u64> {
            self.check()?;
            Ok(match aggregate {
                Aggregate::AcceptedApplications => self.pick(self.accepted, window),
                Aggregate::JobViewCounters => self.pick(self.view_counters, window),
                Aggregate::JobsPosted => self.pick(self.jobs_posted, window),
                _ => 0,
            })
        }

        fn review_intervals(
            &self,
            _scope: Scope,
            _accepted_only: bool,
            _window: Option<&PeriodWindow>,
        ) -> QueryResult<Vec<ReviewInterval>> {
            self.check()?;
            Ok(self.hires.clone())
        }

        fn top_jobs(
            &self,
            _scope: Scope,
            _window: Option<&PeriodWindow>,
            limit: usize,
        ) -> QueryResult<Vec<JobPerformance>> {
            self.check()?;
            Ok(self.top.iter().take(limit).cloned().collect())
        }

        fn recent_activity(
            &self,
            _user_id: UserId,
            _limit: usize,
        ) -> QueryResult<Vec<ActivityEntry>> {
            Ok(Vec::new())
        }

        fn user_signups(&self, _window: Option<&PeriodWindow>) -> QueryResult<Vec<SignupBucket>> {
            Ok(Vec::new())
        }

        fn user_role(&self, _user_id: UserId) -> QueryResult<Option<Role>> {
            Ok(None)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn days(start: &str, counts: &[u64]) -> Vec<TimeBucketCount> {
        let start: NaiveDate = start.parse().unwrap();
        counts
            .iter()
            .enumerate()
            .map(|(offset, &count)| TimeBucketCount {
                date: start + Duration::days(offset as i64),
                count,
            })
            .collect()
    }

    #[test]
    fn doubled_applications_report_hundred_percent() {
        let periods = RangeToken::ThirtyDays.resolve(now());
        let queries = CannedQueries {
            periods: Some(periods),
            current_applications: days("2024-06-10", &[10, 10, 10, 10]),
            previous_applications: days("2024-05-10", &[5, 5, 5, 5]),
            accepted: (10, 10),
            ..CannedQueries::default()
        };

        let report = build_job_seeker_report(&queries, 1, &periods).unwrap();
        assert_eq!(report.comparison.current.applications, 40);
        assert_eq!(report.comparison.previous.applications, 20);
        assert_eq!(report.comparison.percentage_change.applications, 100.0);
        assert_eq!(report.comparison.current.success_rate, 25.0);
        assert_eq!(report.comparison.previous.success_rate, 50.0);
        assert_eq!(report.comparison.percentage_change.success_rate, -50.0);
        assert_eq!(report.comparison.current.jobs_posted, None);
    }

    #[test]
    fn empty_periods_produce_zeroed_stable_report() {
        let periods = RangeToken::ThirtyDays.resolve(now());
        let queries = CannedQueries {
            periods: Some(periods),
            ..CannedQueries::default()
        };

        let report = build_job_seeker_report(&queries, 1, &periods).unwrap();
        assert_eq!(report.comparison.current.applications, 0);
        assert_eq!(report.comparison.percentage_change.applications, 0.0);
        assert_eq!(report.predictive_analytics.direction, TrendDirection::Stable);
        assert_eq!(report.predictive_analytics.next_period_projection, 0);
        assert!(report.timeline.is_empty());
    }

    #[test]
    fn job_seeker_report_marks_placeholders() {
        let periods = RangeToken::SevenDays.resolve(now());
        let queries = CannedQueries {
            periods: Some(periods),
            current_applications: days("2024-06-25", &[1, 3]),
            ..CannedQueries::default()
        };

        let report = build_job_seeker_report(&queries, 1, &periods).unwrap();
        assert_eq!(
            report.predictive_analytics.confidence,
            Metric::Estimated(JOB_SEEKER_CONFIDENCE)
        );
        assert_eq!(
            report.detailed_metrics.candidate_engagement.profile_views,
            Metric::Unavailable
        );
        assert!(report.timeline.iter().all(|point| point.views == 0));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["predictiveAnalytics"]["confidence"], 75);
        assert_eq!(json["predictiveAnalytics"]["trendDirection"], "up");
        assert!(json["detailedMetrics"]["candidateEngagement"]["profileViews"].is_null());
        assert!(json["comparison"]["current"].get("jobsPosted").is_none());
    }

    #[test]
    fn employer_report_merges_views_and_ranks_jobs() {
        let periods = RangeToken::ThirtyDays.resolve(now());
        let applied = now() - Duration::days(10);
        let queries = CannedQueries {
            periods: Some(periods),
            current_applications: [days("2024-06-20", &[4]), days("2024-06-18", &[2])].concat(),
            previous_applications: days("2024-05-20", &[3]),
            current_views: days("2024-06-19", &[12]),
            accepted: (3, 0),
            view_counters: (30, 15),
            jobs_posted: (2, 0),
            categories: vec![CategoryCount {
                category: "interview".into(),
                count: 6,
            }],
            hires: vec![
                ReviewInterval {
                    applied_at: applied,
                    reviewed_at: applied + Duration::days(3),
                },
                ReviewInterval {
                    applied_at: applied,
                    reviewed_at: applied + Duration::days(6),
                },
            ],
            top: vec![JobPerformance {
                id: 7,
                title: "Backend Engineer".into(),
                application_count: 3,
                view_count: 40,
                accepted_count: 1,
                created_at: applied,
            }],
            ..CannedQueries::default()
        };

        let report = build_employer_report(&queries, 2, &periods).unwrap();

        let dates: Vec<String> = report.timeline.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-06-18", "2024-06-19", "2024-06-20"]);
        assert_eq!(report.timeline[1].views, 12);
        assert_eq!(report.timeline[1].applications, 0);

        let comparison = report.comparison;
        assert_eq!(comparison.current.applications, 6);
        assert_eq!(comparison.current.views, 30);
        assert_eq!(comparison.current.jobs_posted, Some(2));
        assert_eq!(comparison.current.success_rate, 50.0);
        assert_eq!(comparison.percentage_change.applications, 100.0);
        assert_eq!(comparison.percentage_change.views, 100.0);
        assert_eq!(comparison.percentage_change.jobs_posted, Some(0.0));

        assert_eq!(report.category_breakdown[0].name, "Interview");
        assert_eq!(report.predictive_analytics.next_period_projection, 90);
        assert_eq!(
            report.predictive_analytics.confidence,
            Metric::Estimated(EMPLOYER_CONFIDENCE)
        );
        assert_eq!(report.detailed_metrics.average_time_to_hire, 5);
        assert_eq!(report.detailed_metrics.top_performing_jobs[0].success_rate, 33.3);

        let json = serde_json::to_value(Report::Employer(report)).unwrap();
        assert_eq!(json["comparison"]["percentageChange"]["jobsPosted"], 0.0);
        assert_eq!(json["detailedMetrics"]["topPerformingJobs"][0]["applications"], 3);
    }

    #[test]
    fn query_failure_aborts_report() {
        let periods = RangeToken::NinetyDays.resolve(now());
        let queries = CannedQueries {
            periods: Some(periods),
            fail: true,
            ..CannedQueries::default()
        };

        assert!(build_job_seeker_report(&queries, 1, &periods).is_err());
        assert!(build_employer_report(&queries, 1, &periods).is_err());
    }
}
