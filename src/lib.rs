pub mod api;
pub mod call_token;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
