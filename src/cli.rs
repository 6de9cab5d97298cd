use std::path::PathBuf;
use std::sync::Arc;

use techfeed::config::{Config, ConfigService};
use techfeed::error::{ErrorCode, FeedError, Result};
use techfeed::feed::SelectionTarget;
use techfeed::protocol::api::{KeywordSuggestion, PostsQuery};
use techfeed::{ApiClient, AuthService, FeedService};

use crate::ui::UI;
use crate::version::format_version_info;
use crate::{Commands, ConfigArgs, ConfigCommand, FeedArgs, KeywordsArgs, KeywordsCommand};

/// CLI handler for processing commands
pub struct CliHandler {
    config_path: Option<PathBuf>,
    ui: Arc<UI>,
}

impl CliHandler {
    /// Create a new CLI handler with a custom config path
    pub fn with_config_path(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            ui: Arc::new(UI::new()),
        }
    }

    /// Load configuration using the handler's config path
    async fn load_config(&self) -> Result<Config> {
        if let Some(path) = &self.config_path {
            Config::load_from(path).await
        } else {
            Config::load().await
        }
    }

    /// Client wired to the terminal for notifications and redirects
    async fn client(&self) -> Result<Arc<ApiClient>> {
        let config = self.load_config().await?;
        let client = ApiClient::builder()
            .config(config.to_client_config()?)
            .notifier(self.ui.clone())
            .navigator(self.ui.clone())
            .build()?;
        Ok(Arc::new(client))
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login => self.handle_login().await,
            Commands::Logout => self.handle_logout().await,
            Commands::Status => self.handle_status().await,
            Commands::Feed(args) => self.handle_feed(args).await,
            Commands::Keywords(args) => self.handle_keywords(args).await,
            Commands::Config(args) => self.handle_config(args).await,
        }
    }

    async fn handle_login(&mut self) -> Result<()> {
        let auth = AuthService::new(self.client().await?);
        let record = auth.guest_login().await?;
        self.ui.success(&format!("Logged in ({})", record.role));
        Ok(())
    }

    async fn handle_logout(&mut self) -> Result<()> {
        let auth = AuthService::new(self.client().await?);
        if auth.require_session().is_err() {
            self.ui.warning("Not logged in");
            return Ok(());
        }
        auth.logout().await?;
        self.ui.success("Logged out");
        Ok(())
    }

    async fn handle_status(&mut self) -> Result<()> {
        let client = self.client().await?;
        let endpoint = client.config().base_url.clone();
        let status = AuthService::new(client.clone()).status();

        // Best effort; the card still renders when the profile is unavailable
        let profile_name = if status.authenticated && !status.expired {
            match FeedService::new(client).me().await {
                Ok(profile) => Some(profile.name).filter(|n| !n.is_empty()),
                Err(e) => {
                    tracing::debug!("Profile lookup failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut rows = vec![
            ("Version", format_version_info()),
            ("Endpoint", endpoint),
            (
                "Session",
                self.ui
                    .format_session_status(status.has_session, status.authenticated, status.expired),
            ),
        ];
        if status.has_session {
            rows.push(("Role", self.ui.format_optional(status.role.map(|r| r.to_string()))));
            if let Some(name) = profile_name {
                rows.push(("User", name));
            }
            rows.push((
                "Expires",
                self.ui
                    .format_optional(status.expires_at.map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())),
            ));
        }
        if !status.guest_keywords.is_empty() {
            let ids: Vec<String> = status.guest_keywords.iter().map(|id| id.to_string()).collect();
            rows.push(("Keywords", ids.join(", ")));
        }

        self.ui.card("Status", rows);
        Ok(())
    }

    async fn handle_feed(&mut self, args: FeedArgs) -> Result<()> {
        let client = self.client().await?;
        AuthService::new(client.clone()).require_session()?;

        let query = PostsQuery {
            page: args.page,
            size: args.size,
            keyword_ids: args.keywords,
        };
        let posts = FeedService::new(client).posts(query).await?;

        self.ui.header(&format!("Feed · page {}", args.page + 1));
        if posts.is_empty() {
            self.ui.info("No posts to show");
            return Ok(());
        }
        for post in &posts {
            self.ui.post(post);
        }
        self.ui.separator();
        Ok(())
    }

    async fn handle_keywords(&mut self, args: KeywordsArgs) -> Result<()> {
        let client = self.client().await?;
        AuthService::new(client.clone()).require_session()?;
        let feed = FeedService::new(client);

        match args.command {
            KeywordsCommand::List => {
                let keywords = feed.keywords().await?;
                self.ui.header("Keywords");
                for keyword in &keywords {
                    self.ui.keyword(keyword);
                }
            }
            KeywordsCommand::Select { ids } => {
                let target = feed.select_keywords(&ids).await?;
                let place = match target {
                    SelectionTarget::Local => "this device",
                    SelectionTarget::Account => "your account",
                };
                if ids.is_empty() {
                    self.ui.success(&format!("Keyword selection cleared on {}", place));
                } else {
                    self.ui.success(&format!("Following {} keyword(s) on {}", ids.len(), place));
                }
            }
            KeywordsCommand::Recommend { entries } => {
                let suggestions: Vec<KeywordSuggestion> = entries.iter().map(|e| parse_suggestion(e)).collect();
                let names = feed.recommend_keywords(&suggestions).await?;
                self.ui.success(&format!("Recommended: {}", names.join(", ")));
            }
        }
        Ok(())
    }

    async fn handle_config(&mut self, args: ConfigArgs) -> Result<()> {
        let config = self.load_config().await?;
        let mut service = if let Some(path) = self.config_path.clone() {
            ConfigService::with_config_path(config, path)
        } else {
            ConfigService::new(config)
        };

        match args.command {
            ConfigCommand::Show => {
                self.ui.card("Configuration", service.summary());
                return Ok(());
            }
            ConfigCommand::SetEndpoint { url } => service.set_endpoint(&url).await?,
            ConfigCommand::SetTimeout { seconds } => service.set_timeout(seconds).await?,
            ConfigCommand::SetVerbose { enabled } => service.set_verbose(&enabled).await?,
            ConfigCommand::Reset => service.reset().await?,
        }
        self.ui.success("Configuration updated");
        Ok(())
    }
}

/// Errors the client already put in front of the user through the notifier
pub fn already_reported(error: &FeedError) -> bool {
    match error {
        FeedError::Network { .. } => true,
        FeedError::Api { description, .. } => description.is_some(),
        FeedError::Authentication { code, .. } => matches!(
            code,
            ErrorCode::SessionExpired | ErrorCode::RefreshTokenMissing | ErrorCode::RefreshFailed
        ),
        _ => false,
    }
}

/// `KO:EN`, where either side may be empty; text without a colon is the Korean name
fn parse_suggestion(entry: &str) -> KeywordSuggestion {
    match entry.split_once(':') {
        Some((ko, en)) => KeywordSuggestion {
            ko_name: ko.trim().to_string(),
            en_name: en.trim().to_string(),
        },
        None => KeywordSuggestion {
            ko_name: entry.trim().to_string(),
            en_name: String::new(),
        },
    }
}
