//! YouTube PlaylistItems API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};

/// Response structure for the `playlistItems.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItemListResponse {
    /// The value will be `youtube#playlistItemListResponse`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `playlistItem` resource identifies one entry of a playlist.
///
/// Its `id` names the entry, not the video; the video is referenced through
/// [`PlaylistItemSnippet::resource_id`].
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: String,
    pub snippet: Option<PlaylistItemSnippet>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItemSnippet {
    pub title: String,
    /// Zero-based position of the entry within the playlist.
    pub position: Option<u32>,
    #[serde(rename = "resourceId")]
    pub resource_id: Option<ResourceId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: String,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}
