//! techfeed: client core for a personalized tech-news feed
//!
//! Every request goes through [`client::ApiClient`], which attaches the
//! stored access token and recovers from expiry on its own: one refresh call
//! at a time, concurrent callers queued behind it, and a forced logout when
//! the session cannot be saved.

pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod logout;
pub mod notify;
pub mod refresh;
pub mod store;

#[cfg(test)]
mod tests;

pub use techfeed_protocol as protocol;

pub use crate::auth::AuthService;
pub use crate::client::{ApiClient, ApiRequest, HttpResponse, HttpTransport, Transport};
pub use crate::config::{ClientConfig, Config};
pub use crate::error::{ErrorCode, FeedError, Result};
pub use crate::feed::FeedService;
pub use crate::notify::{Navigator, Notifier};
pub use crate::store::SessionStore;
