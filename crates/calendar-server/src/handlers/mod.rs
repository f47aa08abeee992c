pub mod events;
pub mod users;

use uuid::Uuid;

/// Ids arrive as opaque strings; anything that is not a UUID cannot match a
/// stored row.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
