mod client;
mod current_user;

pub use client::{ApiClient, ApiError, EventPage};
pub use current_user::{CurrentUser, CurrentUserStore};
