//! YouTube Playlists API types.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Response structure for the `playlists.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistListResponse {
    /// The value will be `youtube#playlistListResponse`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<Playlist>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `playlist` resource represents an ordered collection of videos.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub snippet: Option<PlaylistSnippet>,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
    /// The ID of the channel that published the playlist.
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(rename = "publishedAt", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistContentDetails {
    /// The number of videos in the playlist.
    #[serde(rename = "itemCount")]
    pub item_count: Option<u32>,
}
