mod event;
mod user;

pub use event::*;
pub use user::*;
