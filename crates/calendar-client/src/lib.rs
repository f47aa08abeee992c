pub mod api;
pub mod holidays;
pub mod search;
pub mod templates;
pub mod views;
