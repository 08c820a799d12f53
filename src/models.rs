use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u64;
pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    JobSeeker,
    Employer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::JobSeeker => "job_seeker",
            Role::Employer => "employer",
            Role::Admin => "admin",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub title: String,
    #[serde(default)]
    pub company_id: Option<u64>,
    pub status: String,
    pub created_by_id: UserId,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub application_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: u64,
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobViewRecord {
    pub id: u64,
    pub job_id: JobId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogRecord {
    pub id: u64,
    pub user_id: UserId,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub companies: Vec<CompanyRecord>,
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
    #[serde(default)]
    pub applications: Vec<ApplicationRecord>,
    #[serde(default)]
    pub job_views: Vec<JobViewRecord>,
    #[serde(default)]
    pub activity_logs: Vec<ActivityLogRecord>,
}
