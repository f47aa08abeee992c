mod content_type;
mod rate_limit;

pub use content_type::require_json;
pub use rate_limit::{rate_limit, RateLimiter};
