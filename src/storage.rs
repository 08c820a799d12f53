use crate::models::Dataset;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read data file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse data file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub async fn load_data(path: &Path) -> Result<Dataset, StorageError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "data file not found, starting empty");
            return Ok(Dataset::default());
        }
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let data: Dataset = serde_json::from_slice(&bytes).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        users = data.users.len(),
        jobs = data.jobs.len(),
        applications = data.applications.len(),
        job_views = data.job_views.len(),
        "loaded dataset"
    );
    Ok(data)
}
