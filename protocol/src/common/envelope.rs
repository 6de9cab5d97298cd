//! Response envelope used by every backend endpoint
//!
//! Successful responses look like `{ "result": {...}, "body": T }`. Error
//! responses reuse the same `result` object with `body: null`.

use serde::{Deserialize, Serialize};

/// Status block carried by every response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultInfo {
    #[serde(default)]
    pub result_code: Option<i64>,
    #[serde(default)]
    pub result_message: Option<String>,
    #[serde(default)]
    pub result_description: Option<String>,
}

/// `Api<T>` wrapper returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub result: Option<ResultInfo>,
    #[serde(default = "Option::default")]
    pub body: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_body(self) -> Option<T> {
        self.body
    }
}

/// Spring-style page of items
///
/// Only the fields the client reads are modelled; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}
