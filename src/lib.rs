pub mod approval;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod models;
pub mod notifications;
pub mod scheduler;
pub mod seed;
pub mod state;
pub mod storage;
pub mod upload;
pub mod workflow;

pub use error::{AppError, AppResult, ErrorKind};
pub use state::AppState;
