//! Feed data structures
//!
//! Posts and keywords as the backend serializes them (snake_case).

use serde::{Deserialize, Serialize};

/// Keyword attached to a post or offered for selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keyword {
    pub keyword_id: i64,
    #[serde(default)]
    pub en_name: String,
    #[serde(default)]
    pub ko_name: String,
    #[serde(default)]
    pub selected: Option<bool>,
}

impl Keyword {
    /// Korean name first, then English, then a placeholder
    pub fn display_name(&self) -> &str {
        if !self.ko_name.is_empty() {
            &self.ko_name
        } else if !self.en_name.is_empty() {
            &self.en_name
        } else {
            "Unknown"
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Article in the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default = "Vec::new")]
    pub authors: Vec<Author>,
    #[serde(default = "Vec::new")]
    pub keywords: Vec<Keyword>,
}

/// Signed-in account as returned by `GET /api/user/me`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// Keyword a user proposes for the catalogue
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordSuggestion {
    #[serde(default)]
    pub ko_name: String,
    #[serde(default)]
    pub en_name: String,
}

impl KeywordSuggestion {
    /// Name sent to the backend: `"ko (en)"` when both are given, otherwise
    /// whichever one is. `None` when both are blank.
    pub fn label(&self) -> Option<String> {
        let ko = self.ko_name.trim();
        let en = self.en_name.trim();
        match (ko.is_empty(), en.is_empty()) {
            (false, false) => Some(format!("{} ({})", ko, en)),
            (false, true) => Some(ko.to_string()),
            (true, false) => Some(en.to_string()),
            (true, true) => None,
        }
    }
}
