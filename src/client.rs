//! Outbound request dispatch
//!
//! Every API call goes through `ApiClient::send`, which attaches the bearer
//! token, classifies failures and decides between surfacing the error,
//! refreshing the access token and retrying once, or ending the session.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use techfeed_protocol::api::RefreshTokenResponse;

use crate::classify::{Classification, FailureKind};
use crate::config::ClientConfig;
use crate::error::{FeedError, Result};
use crate::logout::{AutoLogout, SESSION_EXPIRED_MESSAGE};
use crate::notify::{DebouncedNotifier, Navigator, Notifier};
use crate::refresh::{RefreshCoordinator, Ticket};
use crate::store::{parse_expiry, SessionStore};

pub const CONNECTIVITY_MESSAGE: &str = "서버에 연결할 수 없습니다. 네트워크 상태를 확인해주세요.";
pub const NO_REFRESH_TOKEN_MESSAGE: &str = "리프레시 토큰이 없습니다.";
pub const REFRESH_FAILED_MESSAGE: &str = "토큰 갱신에 실패했습니다. 다시 로그인해주세요.";

/// Request as seen by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Already re-sent once after a token refresh
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn authorized(&self, token: Option<&str>) -> Self {
        let mut prepared = self.clone();
        prepared
            .headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case("Authorization"));
        if let Some(token) = token {
            prepared
                .headers
                .push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        prepared
    }
}

/// Raw response: status and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            FeedError::invalid_response(format!("Invalid API response ({}): {}", e, self.body))
        })
    }
}

/// Moves a prepared request over the wire
///
/// Implementations return `FeedError::Network` when no response was received
/// and `Ok` for every response, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse>;
}

/// `Transport` backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut client_builder = Client::builder().timeout(config.request_timeout());

        if !config.use_proxy {
            client_builder = client_builder.no_proxy();
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse> {
        let url = self.config.endpoint_url(&request.path);

        let mut request_builder = self
            .client
            .request(request.method.clone(), &url)
            .header("Content-Type", "application/json");

        if !request.query.is_empty() {
            request_builder = request_builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            request_builder = request_builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            request_builder = request_builder.json(body);
        }

        let response = request_builder.send().await?;
        let status = response.status().as_u16();
        // The server answered; a broken body is not a connectivity failure
        let body = response.text().await.map_err(|e| {
            FeedError::invalid_response(format!("Failed to read response body: {}", e))
        })?;

        if self.config.verbose {
            tracing::debug!("{} {} -> {}", request.method, url, status);
        }

        Ok(HttpResponse { status, body })
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<SessionStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(config.clone())?),
        };
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(SessionStore::from_config(&config.token_storage)?),
        };

        let notifier = Arc::new(DebouncedNotifier::new(self.notifier, config.notify_window()));
        let logout = AutoLogout::new(
            store.clone(),
            notifier.clone(),
            self.navigator,
            config.login_route.clone(),
            config.logout_delay(),
        );

        Ok(ApiClient {
            transport,
            config,
            store,
            notifier,
            logout,
            coordinator: RefreshCoordinator::new(),
        })
    }
}

/// Authenticated API client
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    store: Arc<SessionStore>,
    notifier: Arc<DebouncedNotifier>,
    logout: AutoLogout,
    coordinator: RefreshCoordinator,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn notifier(&self) -> &DebouncedNotifier {
        &self.notifier
    }

    /// Dispatch a request, refreshing the access token and retrying once if
    /// the server reports it expired.
    pub async fn send(&self, request: ApiRequest) -> Result<HttpResponse> {
        let mut request = request;
        let mut renewed_token: Option<String> = None;

        loop {
            let token = renewed_token.take().or_else(|| self.store.access_token());
            let prepared = request.authorized(token.as_deref());

            let response = match self.transport.execute(&prepared).await {
                Ok(response) => response,
                Err(e) if e.is_connectivity_error() => {
                    tracing::warn!("{} {} unreachable: {}", request.method, request.path, e);
                    if !self.config.is_logout_endpoint(&request.path) {
                        self.notifier.show(CONNECTIVITY_MESSAGE);
                    }
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

            if response.is_success() {
                return Ok(response);
            }

            let classification = Classification::from_body(&response.body);
            tracing::debug!(
                "{} {} failed with status {} (code {:?})",
                request.method,
                request.path,
                response.status,
                classification.code
            );

            // Local state is already gone by the time logout is called
            if self.config.is_logout_endpoint(&request.path) {
                return Err(FeedError::api_classified(
                    response.status,
                    classification.code,
                    classification.description,
                ));
            }

            match classification.kind() {
                FailureKind::HardAuth => {
                    let message = classification
                        .description
                        .clone()
                        .unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string());
                    self.logout.trigger(Some(&message)).await;
                    return Err(FeedError::session_expired(message, classification.code));
                }
                FailureKind::AccessExpired
                    if !request.retried && !self.config.is_refresh_endpoint(&request.path) =>
                {
                    let token = self.renew_access_token().await?;
                    tracing::debug!("Retrying {} {} with renewed token", request.method, request.path);
                    request.retried = true;
                    renewed_token = Some(token);
                }
                _ => {
                    if let Some(description) = &classification.description {
                        self.notifier.show(description);
                    }
                    return Err(FeedError::api_classified(
                        response.status,
                        classification.code,
                        classification.description,
                    ));
                }
            }
        }
    }

    /// `send` and decode the response body
    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        self.send(request).await?.json()
    }

    /// Obtain a fresh access token, joining an in-flight refresh if there is one
    async fn renew_access_token(&self) -> Result<String> {
        let Some(refresh_token) = self.store.refresh_token() else {
            tracing::warn!("Access token expired and no refresh token is stored");
            self.logout.trigger(Some(NO_REFRESH_TOKEN_MESSAGE)).await;
            return Err(FeedError::refresh_token_missing(NO_REFRESH_TOKEN_MESSAGE));
        };

        match self.coordinator.begin() {
            Ticket::Waiter(waiter) => waiter.wait().await,
            Ticket::Leader(lease) => {
                let outcome = self.call_refresh_endpoint(&refresh_token).await;
                lease.settle(&outcome);
                if let Err(e) = &outcome {
                    tracing::warn!("Token refresh failed: {}", e);
                    self.logout
                        .trigger(Some(e.user_message().unwrap_or(REFRESH_FAILED_MESSAGE)))
                        .await;
                }
                outcome
            }
        }
    }

    async fn call_refresh_endpoint(&self, refresh_token: &str) -> Result<String> {
        let request = ApiRequest::post(&self.config.refresh_path)
            .with_header(&self.config.refresh_header, refresh_token);

        let response = match self.transport.execute(&request).await {
            Ok(response) => response,
            Err(e) if e.is_connectivity_error() => {
                return Err(FeedError::refresh_failed(CONNECTIVITY_MESSAGE, None));
            }
            Err(e) => return Err(e),
        };

        if !response.is_success() {
            let classification = Classification::from_body(&response.body);
            return Err(FeedError::refresh_failed(
                classification
                    .description
                    .unwrap_or_else(|| REFRESH_FAILED_MESSAGE.to_string()),
                classification.code,
            ));
        }

        let body = response
            .json::<RefreshTokenResponse>()
            .ok()
            .and_then(|envelope| envelope.into_body())
            .ok_or_else(|| FeedError::refresh_failed(REFRESH_FAILED_MESSAGE, None))?;

        let rotated = if self.config.rotate_refresh_token {
            body.refresh_token.as_deref()
        } else {
            None
        };
        self.store.update_access_token(
            &body.access_token,
            body.expired_at.as_deref().and_then(parse_expiry),
            rotated,
        )?;

        tracing::info!("Access token renewed");
        Ok(body.access_token)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("refreshing", &self.coordinator.is_refreshing())
            .finish()
    }
}
