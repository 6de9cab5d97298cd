//! Authentication API DTOs
//!
//! Guest login, token refresh and logout. Refresh and logout carry the
//! refresh token in a dedicated header, so they have no request body.

pub use crate::common::{ApiEnvelope, TokenBody};

/// Guest login response: `{ result, body: { access_token, refresh_token, expired_at, role } }`
pub type GuestLoginResponse = ApiEnvelope<TokenBody>;

/// Refresh response: `{ result, body: { access_token, refresh_token, expired_at } }`
pub type RefreshTokenResponse = ApiEnvelope<TokenBody>;

/// Logout response; the body is never read
pub type LogoutResponse = ApiEnvelope<serde_json::Value>;
