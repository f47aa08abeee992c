mod envelope;
mod events;
mod users;

pub use envelope::*;
pub use events::*;
pub use users::*;
