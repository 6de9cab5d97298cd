//! Authentication-related common types

use serde::{Deserialize, Serialize};

/// Token pair issued by guest login and by the refresh endpoint
///
/// `expired_at` is passed through as the backend formats it; `role` is only
/// present on login responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBody {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expired_at: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}
