//! Failure classification
//!
//! The backend has reported errors in several shapes over time:
//! `{result:{resultCode,...}}`, the legacy `{result:{errorCode,...}}`, the
//! snake_case `{result:{result_code,...}}`, and a bare `{message}`. Each field
//! is looked up through an ordered list of JSON pointers and the first
//! non-empty match wins.

use serde_json::Value;

/// Backend result codes the client reacts to
pub mod codes {
    pub const INVALID_TOKEN: i64 = 2000;
    pub const REFRESH_TOKEN_EXPIRED: i64 = 2001;
    pub const AUTHORIZATION_TOKEN_NOT_FOUND: i64 = 2003;
    pub const REFRESH_TOKEN_NOT_FOUND: i64 = 2005;
    pub const ACCESS_TOKEN_EXPIRED: i64 = 2100;

    /// Codes that end the whole session
    pub const HARD_AUTH: [i64; 4] = [
        REFRESH_TOKEN_EXPIRED,
        INVALID_TOKEN,
        REFRESH_TOKEN_NOT_FOUND,
        AUTHORIZATION_TOKEN_NOT_FOUND,
    ];
}

const CODE_POINTERS: [&str; 3] = ["/result/resultCode", "/result/errorCode", "/result/result_code"];

const DESCRIPTION_POINTERS: [&str; 6] = [
    "/result/resultDescription",
    "/result/resultMessage",
    "/result/description",
    "/result/result_description",
    "/result/result_message",
    "/message",
];

/// How the dispatcher should treat a failed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Access token expired; recoverable through refresh
    AccessExpired,
    /// Session is unusable; log out
    HardAuth,
    /// Anything else, including no code at all
    Unclassified,
}

/// Normalized `(errorCode, description)` pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub code: Option<i64>,
    pub description: Option<String>,
}

impl Classification {
    pub fn from_value(body: &Value) -> Self {
        Self {
            code: CODE_POINTERS.iter().find_map(|p| code_at(body, p)),
            description: DESCRIPTION_POINTERS.iter().find_map(|p| text_at(body, p)),
        }
    }

    /// Classify a raw response body; non-JSON bodies are unclassified
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str::<Value>(body)
            .map(|value| Self::from_value(&value))
            .unwrap_or_default()
    }

    pub fn kind(&self) -> FailureKind {
        match self.code {
            Some(codes::ACCESS_TOKEN_EXPIRED) => FailureKind::AccessExpired,
            Some(code) if codes::HARD_AUTH.contains(&code) => FailureKind::HardAuth,
            _ => FailureKind::Unclassified,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        self.code.is_none() && self.description.is_none()
    }
}

fn code_at(body: &Value, pointer: &str) -> Option<i64> {
    match body.pointer(pointer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_at(body: &Value, pointer: &str) -> Option<String> {
    match body.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case_code_preferred_over_legacy_alias() {
        let c = Classification::from_value(&json!({
            "result": { "errorCode": 2001, "resultCode": 2100 }
        }));
        assert_eq!(c.code, Some(2100));
        assert_eq!(c.kind(), FailureKind::AccessExpired);
    }

    #[test]
    fn test_snake_case_shape() {
        let c = Classification::from_value(&json!({
            "result": {
                "result_code": 2001,
                "result_message": "REFRESH_TOKEN_EXPIRED",
                "result_description": "리프레시 토큰이 만료되었습니다."
            },
            "body": null
        }));
        assert_eq!(c.code, Some(2001));
        assert_eq!(c.description.as_deref(), Some("리프레시 토큰이 만료되었습니다."));
        assert_eq!(c.kind(), FailureKind::HardAuth);
    }

    #[test]
    fn test_description_priority_order() {
        let c = Classification::from_value(&json!({
            "result": {
                "result_message": "last",
                "description": "third",
                "resultMessage": "second",
                "resultDescription": "first"
            }
        }));
        assert_eq!(c.description.as_deref(), Some("first"));

        let c = Classification::from_value(&json!({
            "result": { "result_message": "last", "description": "third" }
        }));
        assert_eq!(c.description.as_deref(), Some("third"));
    }

    #[test]
    fn test_bare_message_shape() {
        let c = Classification::from_value(&json!({ "message": "Bad Request" }));
        assert_eq!(c.code, None);
        assert_eq!(c.description.as_deref(), Some("Bad Request"));
        assert_eq!(c.kind(), FailureKind::Unclassified);
    }

    #[test]
    fn test_empty_description_counts_as_absent() {
        let c = Classification::from_value(&json!({
            "result": { "resultDescription": "", "result_message": "fallback" }
        }));
        assert_eq!(c.description.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_numeric_string_code() {
        let c = Classification::from_value(&json!({ "result": { "resultCode": "2003" } }));
        assert_eq!(c.code, Some(2003));
        assert_eq!(c.kind(), FailureKind::HardAuth);
    }

    #[test]
    fn test_every_hard_auth_code() {
        for code in codes::HARD_AUTH {
            let c = Classification::from_value(&json!({ "result": { "resultCode": code } }));
            assert_eq!(c.kind(), FailureKind::HardAuth, "code {}", code);
        }
    }

    #[test]
    fn test_absent_fields_yield_nothing() {
        let c = Classification::from_body("<html>502 Bad Gateway</html>");
        assert!(c.is_unclassified());
        assert_eq!(c.kind(), FailureKind::Unclassified);

        let c = Classification::from_body(r#"{"result":{},"body":null}"#);
        assert!(c.is_unclassified());

        let c = Classification::from_body("");
        assert!(c.is_unclassified());
    }
}
