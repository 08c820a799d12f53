use crate::errors::AppError;
use crate::models::{Role, UserId};
use crate::query::ReportQueries;
use axum::http::HeaderMap;
use tracing::debug;

pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn require(self, role: Role) -> Result<Self, AppError> {
        if self.role != role {
            return Err(AppError::forbidden(format!(
                "Unauthorized - {} only",
                audience(role)
            )));
        }
        Ok(self)
    }
}

fn audience(role: Role) -> &'static str {
    match role {
        Role::JobSeeker => "job seekers",
        Role::Employer => "employers",
        Role::Admin => "admins",
    }
}

pub fn resolve_caller<Q>(headers: &HeaderMap, queries: &Q) -> Result<Caller, AppError>
where
    Q: ReportQueries + ?Sized,
{
    let user_id = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<UserId>().ok())
        .ok_or_else(|| AppError::unauthorized("authentication required"))?;

    let role = queries
        .user_role(user_id)
        .map_err(|err| AppError::internal("Failed to resolve user", err))?
        .ok_or_else(|| AppError::unauthorized("authentication required"))?;

    debug!(user_id, role = %role, "resolved caller");
    Ok(Caller { user_id, role })
}
