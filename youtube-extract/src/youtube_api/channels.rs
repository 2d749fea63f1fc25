//! YouTube Channels API types.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Response structure for the `channels.list` API call.
///
/// Contains a list of [`Channel`] resources that match the request criteria,
/// along with pagination information in [`PageInfo`].
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelListResponse {
    /// Identifies the API resource's type.
    ///
    /// The value will be `youtube#channelListResponse`.
    #[serde(default)]
    pub kind: String,
    /// A list of channels that match the request criteria.
    ///
    /// Omitted by the API when nothing matched.
    #[serde(default)]
    pub items: Vec<Channel>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `channel` resource contains information about a YouTube channel.
///
/// Which of the optional parts are present depends on the `part` parameter of the request.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: String,
    /// Contains basic details about the channel.
    pub snippet: Option<ChannelSnippet>,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<ChannelContentDetails>,
    pub statistics: Option<ChannelStatistics>,
}

/// The snippet object contains basic details about the channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelSnippet {
    /// The channel's title.
    pub title: String,
    /// The channel's description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The date and time that the channel was created.
    #[serde(rename = "publishedAt", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

/// See: <https://developers.google.com/youtube/v3/docs/channels#contentDetails>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists")]
    pub related_playlists: Option<RelatedPlaylists>,
}

/// Playlists YouTube maintains automatically for every channel.
#[derive(Debug, Serialize, Deserialize)]
pub struct RelatedPlaylists {
    pub likes: Option<String>,
    /// The playlist containing the channel's uploaded videos.
    pub uploads: Option<String>,
}

/// Statistics about the channel.
///
/// The API encodes counts as decimal strings.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#statistics>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelStatistics {
    /// The number of times the channel has been viewed.
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
}
