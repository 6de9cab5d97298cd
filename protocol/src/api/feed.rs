//! Feed API DTOs

use serde::{Deserialize, Serialize};

pub use crate::common::{ApiEnvelope, Keyword, KeywordSuggestion, Page, Post, UserProfile};

pub type PostsResponse = ApiEnvelope<Page<Post>>;
pub type KeywordsResponse = ApiEnvelope<Vec<Keyword>>;
/// Ids of the keywords a signed-in user follows
pub type UserKeywordsResponse = ApiEnvelope<Vec<i64>>;
pub type MeResponse = ApiEnvelope<UserProfile>;
/// Acknowledgement with no meaningful body
pub type EmptyResponse = ApiEnvelope<serde_json::Value>;

/// Body for replacing a user's keyword selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateUserKeywordsRequest {
    #[serde(rename = "keywordIds")]
    pub keyword_ids: Vec<i64>,
}

/// Body for proposing new keywords
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendKeywordsRequest {
    pub names: Vec<String>,
}

impl RecommendKeywordsRequest {
    /// Labels of every suggestion with at least one name; blank ones are skipped
    pub fn from_suggestions(suggestions: &[KeywordSuggestion]) -> Self {
        Self {
            names: suggestions.iter().filter_map(KeywordSuggestion::label).collect(),
        }
    }
}

/// Query for `GET /api/posts`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostsQuery {
    pub page: u32,
    pub size: u32,
    /// Sent as repeated `keywordIds` parameters; omitted when empty
    pub keyword_ids: Vec<i64>,
}

impl Default for PostsQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 30,
            keyword_ids: Vec::new(),
        }
    }
}

impl PostsQuery {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
        ];
        for id in &self.keyword_ids {
            pairs.push(("keywordIds".to_string(), id.to_string()));
        }
        pairs
    }
}
