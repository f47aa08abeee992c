pub mod api;
pub mod models;
pub mod text;
pub mod time;

pub use models::*;
