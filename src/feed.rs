//! Feed, keyword and account endpoints

use reqwest::Method;
use std::sync::Arc;

use techfeed_protocol::api::{
    EmptyResponse, KeywordsResponse, MeResponse, PostsQuery, PostsResponse,
    RecommendKeywordsRequest, UpdateUserKeywordsRequest, UserKeywordsResponse,
};
use techfeed_protocol::common::{Keyword, KeywordSuggestion, Post, UserProfile};

use crate::client::{ApiClient, ApiRequest};
use crate::error::{FeedError, Result};

pub const POSTS_PATH: &str = "/api/posts";
pub const KEYWORDS_PATH: &str = "/api/keywords";

/// Shown when a recommendation has no usable name
pub const EMPTY_RECOMMENDATION_MESSAGE: &str = "최소 하나의 키워드를 입력해주세요.";

/// Where a keyword selection was saved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTarget {
    /// Guest session: kept in local session storage
    Local,
    /// Signed-in user: stored on the server
    Account,
}

pub struct FeedService {
    client: Arc<ApiClient>,
}

impl FeedService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Fetch one page of posts.
    ///
    /// Guests without an explicit filter get their saved keyword selection.
    pub async fn posts(&self, mut query: PostsQuery) -> Result<Vec<Post>> {
        let store = self.client.store();
        if query.keyword_ids.is_empty() && store.is_guest() {
            query.keyword_ids = store.guest_keywords();
        }

        let request = ApiRequest::get(POSTS_PATH).with_query(query.to_query_pairs());
        let response: PostsResponse = self.client.send_json(request).await?;

        let posts = response.into_body().map(|page| page.content).unwrap_or_default();
        tracing::debug!("Fetched {} post(s) from page {}", posts.len(), query.page);
        Ok(posts)
    }

    /// All keywords. For guests `selected` reflects the local selection;
    /// signed-in users get the server's flags as-is.
    pub async fn keywords(&self) -> Result<Vec<Keyword>> {
        let response: KeywordsResponse = self.client.send_json(ApiRequest::get(KEYWORDS_PATH)).await?;
        let mut keywords = response.into_body().unwrap_or_default();

        let store = self.client.store();
        if store.is_guest() {
            let chosen = store.guest_keywords();
            for keyword in keywords.iter_mut() {
                keyword.selected = Some(chosen.contains(&keyword.keyword_id));
            }
        }
        Ok(keywords)
    }

    /// Save a keyword selection where the current role keeps it
    pub async fn select_keywords(&self, ids: &[i64]) -> Result<SelectionTarget> {
        let selection = self.validated_selection(ids).await?;

        if self.client.store().is_guest() {
            self.client.store().set_guest_keywords(&selection)?;
            tracing::info!("Saved {} keyword(s) for guest feed", selection.len());
            Ok(SelectionTarget::Local)
        } else {
            self.update_user_keywords(&selection).await?;
            tracing::info!("Synced {} keyword(s) to account", selection.len());
            Ok(SelectionTarget::Account)
        }
    }

    /// Keyword ids the signed-in user follows
    pub async fn user_keywords(&self) -> Result<Vec<i64>> {
        let path = self.client.config().user_keywords_path.clone();
        let response: UserKeywordsResponse = self.client.send_json(ApiRequest::get(path)).await?;
        Ok(response.into_body().unwrap_or_default())
    }

    /// Replace the signed-in user's keyword selection
    pub async fn update_user_keywords(&self, ids: &[i64]) -> Result<()> {
        let body = serde_json::to_value(UpdateUserKeywordsRequest {
            keyword_ids: ids.to_vec(),
        })?;
        let path = self.client.config().user_keywords_path.clone();
        let _: EmptyResponse = self
            .client
            .send_json(ApiRequest::new(Method::PUT, path).with_json(body))
            .await?;
        Ok(())
    }

    /// Propose new keywords; returns the names that were sent
    pub async fn recommend_keywords(&self, suggestions: &[KeywordSuggestion]) -> Result<Vec<String>> {
        let request = RecommendKeywordsRequest::from_suggestions(suggestions);
        if request.names.is_empty() {
            return Err(FeedError::invalid_input(EMPTY_RECOMMENDATION_MESSAGE));
        }

        let path = self.client.config().recommend_keywords_path.clone();
        let _: EmptyResponse = self
            .client
            .send_json(ApiRequest::post(path).with_json(serde_json::to_value(&request)?))
            .await?;
        tracing::info!("Recommended {} keyword(s)", request.names.len());
        Ok(request.names)
    }

    /// Profile of the signed-in user
    pub async fn me(&self) -> Result<UserProfile> {
        let path = self.client.config().me_path.clone();
        let response: MeResponse = self.client.send_json(ApiRequest::get(path)).await?;
        response
            .into_body()
            .ok_or_else(|| FeedError::invalid_response("No data in profile response"))
    }

    /// Sorted, deduplicated ids, each checked against the keyword catalogue
    async fn validated_selection(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if !ids.is_empty() {
            let known = self.keywords().await?;
            if let Some(unknown) = ids.iter().find(|id| !known.iter().any(|k| k.keyword_id == **id)) {
                return Err(FeedError::invalid_input(format!("Unknown keyword id: {}", unknown)));
            }
        }

        let mut selection = ids.to_vec();
        selection.sort_unstable();
        selection.dedup();
        Ok(selection)
    }
}

impl std::fmt::Debug for FeedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedService").field("client", &self.client).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpResponse;
    use crate::error::ErrorCode;
    use crate::store::{SessionStore, GUEST_KEYWORDS_KEY, USER_ROLE_KEY};
    use crate::tests::mocks::MockTransport;
    use crate::tests::utils::test_helpers::*;
    use serde_json::json;

    const USER_KEYWORDS: &str = "/api/user/keywords";
    const RECOMMEND: &str = "/api/keywords/recommend";
    const ME: &str = "/api/user/me";

    fn catalogue_backend(request: &ApiRequest) -> Result<HttpResponse> {
        match request.path.as_str() {
            KEYWORDS_PATH => Ok(ok_json(json!([
                { "keyword_id": 1, "en_name": "Rust", "ko_name": "러스트" },
                { "keyword_id": 2, "en_name": "Go", "ko_name": "고" },
                { "keyword_id": 3, "en_name": "AI", "ko_name": "인공지능", "selected": true }
            ]))),
            USER_KEYWORDS if request.method == Method::GET => Ok(ok_json(json!([3]))),
            USER_KEYWORDS | RECOMMEND => Ok(ok_json(json!(null))),
            ME => Ok(ok_json(json!({ "id": 42, "name": "dev", "region": "KR" }))),
            _ => Ok(ok_json(json!({
                "content": [{ "id": 7, "title": "Async Rust" }],
                "total_pages": 1,
                "last": true
            }))),
        }
    }

    fn member_store() -> Arc<SessionStore> {
        let store = seeded_store();
        store.set(USER_ROLE_KEY, "USER").unwrap();
        store
    }

    fn keyword_params(request: &ApiRequest) -> Vec<&str> {
        request
            .query
            .iter()
            .filter(|(k, _)| k == "keywordIds")
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_guest_feed_uses_saved_keywords() {
        let h = harness(MockTransport::new(catalogue_backend), seeded_store());
        let feed = FeedService::new(h.client.clone());

        let posts = feed.posts(PostsQuery::default()).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Async Rust");
        assert_eq!(keyword_params(&h.transport.requests_to(POSTS)[0]), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_explicit_filter_wins() {
        let h = harness(MockTransport::new(catalogue_backend), seeded_store());
        let feed = FeedService::new(h.client.clone());

        let query = PostsQuery {
            keyword_ids: vec![3],
            ..PostsQuery::default()
        };
        feed.posts(query).await.unwrap();
        assert_eq!(keyword_params(&h.transport.requests_to(POSTS)[0]), vec!["3"]);
    }

    #[tokio::test]
    async fn test_member_feed_ignores_guest_selection() {
        let h = harness(MockTransport::new(catalogue_backend), member_store());

        FeedService::new(h.client.clone()).posts(PostsQuery::default()).await.unwrap();
        assert!(keyword_params(&h.transport.requests_to(POSTS)[0]).is_empty());
    }

    #[tokio::test]
    async fn test_missing_body_yields_empty_feed() {
        let h = harness(
            MockTransport::new(|_| Ok(ok_json(json!(null)))),
            Arc::new(SessionStore::in_memory()),
        );

        let posts = FeedService::new(h.client.clone()).posts(PostsQuery::default()).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_guest_keywords_reflect_local_selection() {
        let h = harness(MockTransport::new(catalogue_backend), seeded_store());

        let keywords = FeedService::new(h.client.clone()).keywords().await.unwrap();
        let selected: Vec<i64> = keywords
            .iter()
            .filter(|k| k.selected == Some(true))
            .map(|k| k.keyword_id)
            .collect();
        // Server flag on 3 is ignored for guests
        assert_eq!(selected, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_member_keywords_keep_server_flags() {
        let h = harness(MockTransport::new(catalogue_backend), member_store());

        let keywords = FeedService::new(h.client.clone()).keywords().await.unwrap();
        let selected: Vec<i64> = keywords
            .iter()
            .filter(|k| k.selected == Some(true))
            .map(|k| k.keyword_id)
            .collect();
        assert_eq!(selected, vec![3]);
        assert_eq!(keywords[0].selected, None);
    }

    #[tokio::test]
    async fn test_guest_selection_is_stored_locally() {
        let h = harness(MockTransport::new(catalogue_backend), seeded_store());
        let feed = FeedService::new(h.client.clone());

        let err = feed.select_keywords(&[2, 99]).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert_eq!(h.store.guest_keywords(), vec![1, 2]);

        assert_eq!(feed.select_keywords(&[3, 1, 3]).await.unwrap(), SelectionTarget::Local);
        assert_eq!(h.store.guest_keywords(), vec![1, 3]);
        assert_eq!(h.transport.count(USER_KEYWORDS), 0);

        feed.select_keywords(&[]).await.unwrap();
        assert!(!h.store.contains(GUEST_KEYWORDS_KEY));
    }

    #[tokio::test]
    async fn test_member_selection_is_synced_to_account() {
        let h = harness(MockTransport::new(catalogue_backend), member_store());
        let feed = FeedService::new(h.client.clone());

        assert_eq!(feed.select_keywords(&[2, 1, 2]).await.unwrap(), SelectionTarget::Account);

        let sent = h.transport.requests_to(USER_KEYWORDS);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(sent[0].body, Some(json!({ "keywordIds": [1, 2] })));
        // Local guest selection is left alone
        assert_eq!(h.store.guest_keywords(), vec![1, 2]);
        assert_eq!(h.store.get(GUEST_KEYWORDS_KEY).as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn test_user_keywords_reads_account_selection() {
        let h = harness(MockTransport::new(catalogue_backend), member_store());

        let ids = FeedService::new(h.client.clone()).user_keywords().await.unwrap();
        assert_eq!(ids, vec![3]);
        assert_eq!(h.transport.requests_to(USER_KEYWORDS)[0].method, Method::GET);
    }

    #[tokio::test]
    async fn test_recommend_sends_formatted_names() {
        let h = harness(MockTransport::new(catalogue_backend), member_store());
        let feed = FeedService::new(h.client.clone());

        let names = feed
            .recommend_keywords(&[
                KeywordSuggestion {
                    ko_name: "리액트".to_string(),
                    en_name: "React".to_string(),
                },
                KeywordSuggestion {
                    ko_name: String::new(),
                    en_name: "Zig".to_string(),
                },
            ])
            .await
            .unwrap();

        assert_eq!(names, vec!["리액트 (React)", "Zig"]);
        let sent = h.transport.requests_to(RECOMMEND);
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].body, Some(json!({ "names": ["리액트 (React)", "Zig"] })));
    }

    #[tokio::test]
    async fn test_recommend_rejects_blank_suggestions_locally() {
        let h = harness(MockTransport::new(catalogue_backend), member_store());

        let err = FeedService::new(h.client.clone())
            .recommend_keywords(&[KeywordSuggestion::default()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_me_returns_profile() {
        let h = harness(MockTransport::new(catalogue_backend), member_store());

        let profile = FeedService::new(h.client.clone()).me().await.unwrap();
        assert_eq!(profile.id, 42);
        assert_eq!(profile.name, "dev");
        assert_eq!(profile.region.as_deref(), Some("KR"));
    }
}
