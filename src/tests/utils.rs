//! Test utilities and helpers for unit tests
//!
//! This module provides common testing utilities including:
//! - Canned backend responses
//! - Seeded session stores
//! - A fully wired client over a mock transport

#[cfg(test)]
pub mod test_helpers {
    use serde_json::{json, Value};
    use std::sync::Arc;

    use crate::client::{ApiClient, ApiRequest, HttpResponse};
    use crate::config::ClientConfig;
    use crate::store::{
        SessionStore, ACCESS_TOKEN_KEY, EXPIRES_AT_KEY, GUEST_KEYWORDS_KEY, GUEST_UUID_KEY,
        REFRESH_TOKEN_KEY, USER_ID_KEY, USER_ROLE_KEY,
    };
    use crate::tests::mocks::{MockTransport, RecordingNavigator, RecordingNotifier};

    pub const POSTS: &str = "/api/posts";
    pub const REFRESH: &str = "/api/auth/refresh";
    pub const LOGOUT: &str = "/api/auth/logout";

    pub fn ok_json(body: Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: json!({
                "result": { "result_code": 200, "result_message": "OK", "result_description": "성공" },
                "body": body
            })
            .to_string(),
        }
    }

    pub fn failure(status: u16, body: Value) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    /// Response carrying a backend result code in the current shape
    pub fn coded(status: u16, code: i64, description: &str) -> HttpResponse {
        failure(
            status,
            json!({
                "result": { "resultCode": code, "resultDescription": description },
                "body": null
            }),
        )
    }

    pub fn access_expired() -> HttpResponse {
        coded(401, 2100, "액세스 토큰이 만료되었습니다.")
    }

    pub fn refreshed(access_token: &str, refresh_token: &str) -> HttpResponse {
        ok_json(json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expired_at": "2030-01-01T00:00:00"
        }))
    }

    pub fn bearer(request: &ApiRequest) -> Option<&str> {
        request.header("Authorization")
    }

    /// In-memory store holding a guest session (T1/R1) and every auxiliary key
    pub fn seeded_store() -> Arc<SessionStore> {
        let store = SessionStore::in_memory();
        store.set(ACCESS_TOKEN_KEY, "T1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        store.set(USER_ROLE_KEY, "GUEST").unwrap();
        store.set(USER_ID_KEY, "42").unwrap();
        store.set(GUEST_UUID_KEY, "0b6c7f0e-guest").unwrap();
        store.set(GUEST_KEYWORDS_KEY, "[1,2]").unwrap();
        store.set(EXPIRES_AT_KEY, "2030-01-01T00:00:00+00:00").unwrap();
        Arc::new(store)
    }

    pub struct Harness {
        pub client: Arc<ApiClient>,
        pub transport: Arc<MockTransport>,
        pub store: Arc<SessionStore>,
        pub notifier: Arc<RecordingNotifier>,
        pub navigator: Arc<RecordingNavigator>,
    }

    pub fn harness(transport: MockTransport, store: Arc<SessionStore>) -> Harness {
        harness_with_config(transport, store, ClientConfig::default())
    }

    pub fn harness_with_config(
        transport: MockTransport,
        store: Arc<SessionStore>,
        config: ClientConfig,
    ) -> Harness {
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());

        let client = ApiClient::builder()
            .config(config)
            .transport(transport.clone())
            .store(store.clone())
            .notifier(notifier.clone())
            .navigator(navigator.clone())
            .build()
            .expect("Failed to build test client");
        let client = Arc::new(client);

        Harness {
            client,
            transport,
            store,
            notifier,
            navigator,
        }
    }

    /// Backend where only `Bearer T2` is valid and refresh hands out T2
    pub fn rotating_backend(request: &ApiRequest) -> crate::error::Result<HttpResponse> {
        if request.path == REFRESH {
            return Ok(refreshed("T2", "R9"));
        }
        match bearer(request) {
            Some("Bearer T2") => Ok(ok_json(json!({ "content": [], "last": true }))),
            _ => Ok(access_expired()),
        }
    }
}
