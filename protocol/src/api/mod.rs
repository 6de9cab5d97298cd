//! API DTOs module
//!
//! This module contains request and response types organized by domain:
//! - `auth`: guest login, token refresh and logout
//! - `feed`: posts and keywords

pub mod auth;
pub mod feed;

pub use auth::*;
pub use feed::*;
