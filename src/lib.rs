pub mod aggregate;
pub mod analytics;
pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod period;
pub mod query;
pub mod reports;
pub mod state;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_data;
