use serde::{Deserialize, Serialize};

/// Body of `POST /api/users`. Missing fields deserialize as empty strings and
/// are reported by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}
