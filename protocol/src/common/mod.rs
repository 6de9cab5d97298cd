pub mod auth;
pub mod envelope;
pub mod feed;

pub use auth::*;
pub use envelope::*;
pub use feed::*;
