use crate::models::Dataset;
use crate::period::RangePolicy;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub data: Arc<Dataset>,
    pub range_policy: RangePolicy,
}

impl AppState {
    pub fn new(data: Dataset, range_policy: RangePolicy) -> Self {
        Self {
            data: Arc::new(data),
            range_policy,
        }
    }
}
