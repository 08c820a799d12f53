use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

pub const TREND_WINDOW: usize = 7;
pub const PROJECTION_DAYS: f64 = 30.0;

pub const DEFAULT_CATEGORY_COLOR: &str = "#6b7280";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBucketCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub applications: u64,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: u64,
    pub color: &'static str,
}

/// A stand-in constant or a value the store cannot provide. Serialises as
/// the bare value, or `null` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric<T> {
    Estimated(T),
    Unavailable,
}

impl<T: Serialize> Serialize for Metric<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Estimated(value) => value.serialize(serializer),
            Metric::Unavailable => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetrics {
    pub applications: u64,
    pub views: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs_posted: Option<u64>,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PercentageChange {
    pub applications: f64,
    pub views: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs_posted: Option<f64>,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub current: PeriodMetrics,
    pub previous: PeriodMetrics,
    pub percentage_change: PercentageChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendProjection {
    #[serde(rename = "nextMonthProjection")]
    pub next_period_projection: i64,
    #[serde(rename = "trendDirection")]
    pub direction: TrendDirection,
    pub confidence: Metric<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewInterval {
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewInterval {
    pub fn days(&self) -> i64 {
        (self.reviewed_at - self.applied_at).num_days()
    }
}

pub fn compute_totals(rows: &[TimeBucketCount]) -> u64 {
    rows.iter().fold(0u64, |total, row| total.saturating_add(row.count))
}

pub fn compute_success_rate(total: u64, successes: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    successes as f64 / total as f64 * 100.0
}

pub fn compute_percentage_change(current: f64, previous: f64) -> f64 {
    if previous <= 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

// Dates without rows stay absent.
pub fn build_timeline(mut rows: Vec<TimeBucketCount>) -> Vec<TimeBucketCount> {
    rows.sort_by_key(|row| row.date);
    rows
}

pub fn merge_timelines(
    applications: &[TimeBucketCount],
    views: &[TimeBucketCount],
) -> Vec<TimelinePoint> {
    let mut merged: BTreeMap<NaiveDate, TimelinePoint> = BTreeMap::new();

    for row in applications {
        merged
            .entry(row.date)
            .or_insert_with(|| empty_point(row.date))
            .applications = row.count;
    }
    for row in views {
        merged
            .entry(row.date)
            .or_insert_with(|| empty_point(row.date))
            .views = row.count;
    }

    merged.into_values().collect()
}

fn empty_point(date: NaiveDate) -> TimelinePoint {
    TimelinePoint {
        date,
        applications: 0,
        views: 0,
    }
}

pub fn build_category_breakdown(rows: &[CategoryCount]) -> Vec<CategorySlice> {
    rows.iter()
        .map(|row| CategorySlice {
            name: title_case(&row.category),
            value: row.count,
            color: category_color(&row.category),
        })
        .collect()
}

pub fn category_color(category: &str) -> &'static str {
    match category {
        "pending" => "#f59e0b",
        "reviewed" => "#3b82f6",
        "interview" => "#8b5cf6",
        "accepted" => "#10b981",
        "rejected" => "#ef4444",
        "withdrawn" => "#6b7280",
        _ => DEFAULT_CATEGORY_COLOR,
    }
}

pub fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn project_trend(timeline: &[TimeBucketCount], confidence: Metric<u8>) -> TrendProjection {
    let recent = &timeline[timeline.len().saturating_sub(TREND_WINDOW)..];
    let average = mean(recent);

    let direction = if recent.len() < 2 {
        TrendDirection::Stable
    } else {
        let (first, second) = recent.split_at(recent.len().div_ceil(2));
        let (first_avg, second_avg) = (mean(first), mean(second));
        if second_avg > first_avg * 1.1 {
            TrendDirection::Up
        } else if second_avg < first_avg * 0.9 {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    };

    TrendProjection {
        next_period_projection: (average * PROJECTION_DAYS).round() as i64,
        direction,
        confidence,
    }
}

fn mean(rows: &[TimeBucketCount]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    compute_totals(rows) as f64 / rows.len() as f64
}

pub fn compare(current: PeriodMetrics, previous: PeriodMetrics) -> ComparisonResult {
    let percentage_change = PercentageChange {
        applications: compute_percentage_change(
            current.applications as f64,
            previous.applications as f64,
        ),
        views: compute_percentage_change(current.views as f64, previous.views as f64),
        jobs_posted: current
            .jobs_posted
            .zip(previous.jobs_posted)
            .map(|(now, before)| compute_percentage_change(now as f64, before as f64)),
        success_rate: compute_percentage_change(current.success_rate, previous.success_rate),
    };

    ComparisonResult {
        current,
        previous,
        percentage_change,
    }
}

pub fn average_review_days(intervals: &[ReviewInterval]) -> f64 {
    if intervals.is_empty() {
        return 0.0;
    }
    let days: i64 = intervals.iter().map(ReviewInterval::days).sum();
    days as f64 / intervals.len() as f64
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
