//! Session lifecycle: guest login, logout and status

use chrono::{DateTime, Utc};
use std::sync::Arc;

use techfeed_protocol::api::GuestLoginResponse;

use crate::client::{ApiClient, ApiRequest};
use crate::error::{FeedError, Result};
use crate::store::{parse_expiry, CredentialRecord, Role, SessionStore};

/// Shown when a command needs a session and none is stored
pub const ACCESS_DENIED_MESSAGE: &str = "접근 권한이 없습니다.";

/// Snapshot of the locally stored session
#[derive(Debug, Clone, PartialEq)]
pub struct StatusInfo {
    pub has_session: bool,
    pub authenticated: bool,
    pub role: Option<Role>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
    pub guest_keywords: Vec<i64>,
}

pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn store(&self) -> &SessionStore {
        self.client.store()
    }

    /// Obtain a guest session and persist its credentials
    pub async fn guest_login(&self) -> Result<CredentialRecord> {
        let path = self.client.config().guest_login_path.clone();
        let response: GuestLoginResponse = self.client.send_json(ApiRequest::post(path)).await?;

        let body = response
            .into_body()
            .ok_or_else(|| FeedError::authentication("No data in guest login response"))?;
        let refresh_token = body
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FeedError::authentication("Guest login returned no refresh token"))?;

        let record = CredentialRecord {
            access_token: body.access_token,
            refresh_token,
            role: body.role.as_deref().map(Role::parse).unwrap_or(Role::Guest),
            expires_at: body.expired_at.as_deref().and_then(parse_expiry),
        };
        self.store().save_credentials(&record)?;

        tracing::info!("Logged in as {}", record.role);
        Ok(record)
    }

    /// Revoke the session server-side (best effort) and wipe local state
    pub async fn logout(&self) -> Result<()> {
        let config = self.client.config();
        let mut request = ApiRequest::post(config.logout_path.clone());
        if let Some(refresh_token) = self.store().refresh_token() {
            request = request.with_header(config.refresh_header.clone(), refresh_token);
        }

        if let Err(e) = self.client.send(request).await {
            tracing::debug!("Logout request failed: {}", e);
        }

        self.store().clear_session()?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub fn status(&self) -> StatusInfo {
        let store = self.store();
        let expires_at = store.expires_at();
        StatusInfo {
            has_session: store.has_session(),
            authenticated: store.is_authenticated(),
            role: store.role(),
            expires_at,
            expired: expires_at.is_some_and(|at| at <= Utc::now()),
            guest_keywords: store.guest_keywords(),
        }
    }

    /// Fail with access denied unless an access token is stored
    pub fn require_session(&self) -> Result<()> {
        if self.store().has_session() {
            Ok(())
        } else {
            Err(FeedError::access_denied(ACCESS_DENIED_MESSAGE))
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").field("client", &self.client).finish()
    }
}
