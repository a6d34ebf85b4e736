use serde::{Deserialize, Serialize};

/// Body of `POST /accounts/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
}

/// Body of `PUT /players/{id}/account`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAccountRequest {
    pub email: String,
    /// Only consulted when the player has no account yet
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}
