//! Extracts a YouTube channel's playlists and their entries on behalf of an OAuth-authorized
//! user.
//!
//! The pieces, bottom-up:
//!
//! - [`credentials::CredentialStore`] caches the OAuth token between runs.
//! - [`session::AuthorizationSession`] turns that cache (or a fresh consent) into a
//!   [`youtube_api::YouTubeClient`] that refreshes its token transparently.
//! - [`extract::run`] walks account → playlists → entries with that client.

pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod oauth;
pub mod session;
pub mod youtube_api;

#[cfg(test)]
mod test_support;

pub use config::AuthConfig;
pub use credentials::{CredentialStore, Token};
pub use error::{Error, Result};
pub use extract::{CHANNEL_PARTS, Channel, ChannelTree, Collection, Item, Query};
pub use oauth::{AuthorizationServer, OAuthManager};
pub use session::{AuthorizationSession, ConsentPrompt, TerminalPrompt};
pub use youtube_api::{AuthenticatedRequest, YouTubeClient};
