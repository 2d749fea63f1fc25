//! YouTube Data API v3 client.
//!
//! The client in [`client`] authenticates every request with a bearer token and refreshes that
//! token transparently when it expires. The remaining modules hold the wire types of the three
//! list endpoints this crate reads:
//!
//! - [`channels`] for `channels.list`
//! - [`playlists`] for `playlists.list`
//! - [`playlist_items`] for `playlistItems.list`
//!
//! Only the first page of each listing is ever requested.

pub mod channels;
pub mod client;
pub mod playlist_items;
pub mod playlists;
pub mod types;

pub use client::{AuthenticatedRequest, DEFAULT_BASE_URL, YouTubeClient};
pub use types::PageInfo;

pub use channels::{Channel, ChannelListResponse, ChannelSnippet, ChannelStatistics};
pub use playlist_items::{PlaylistItem, PlaylistItemListResponse, PlaylistItemSnippet};
pub use playlists::{Playlist, PlaylistListResponse, PlaylistSnippet};
