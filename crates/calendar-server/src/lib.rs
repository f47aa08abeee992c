pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod validation;

pub use config::Config;
pub use routes::{create_router, AppState};
