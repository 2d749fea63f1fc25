//! Walking account → playlists → playlist entries.
//!
//! Each level is one request, issued strictly in order. No page size is sent, so every listing
//! holds the API's default first page; when the API reports more pages they are skipped with a
//! warning, not fetched.

use crate::error::{Error, Result};
use crate::youtube_api::{
    AuthenticatedRequest, ChannelListResponse, PlaylistItemListResponse, PlaylistListResponse,
};
use indexmap::IndexSet;
use std::sync::Arc;
use tracing::instrument;

/// Field groups requested for the channel lookup.
pub const CHANNEL_PARTS: [&str; 3] = ["snippet", "contentDetails", "statistics"];

const PLAYLIST_PARTS: &str = "contentDetails,id,snippet";
const PLAYLIST_ITEM_PARTS: &str = "id,snippet";

/// What to extract: one account name plus the field groups to request for its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    account: String,
    fields: IndexSet<String>,
}

impl Query {
    /// Duplicate field groups are dropped, keeping the first occurrence's position.
    pub fn new<I, S>(account: impl Into<String>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let account = account.into();
        if account.trim().is_empty() {
            return Err(Error::InvalidQuery("account name must not be empty".into()));
        }
        let fields: IndexSet<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(Error::InvalidQuery("no field groups requested".into()));
        }
        Ok(Self { account, fields })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn fields(&self) -> &IndexSet<String> {
        &self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub view_count: u64,
}

/// A playlist of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub channel: Arc<Channel>,
    pub items: Vec<Item>,
}

impl Collection {
    /// Returns this collection with `items` attached.
    pub fn with_items(self, items: Vec<Item>) -> Self {
        Self { items, ..self }
    }
}

/// One entry of a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: String,
}

/// A resolved channel with its fully populated collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTree {
    pub channel: Arc<Channel>,
    pub collections: Vec<Collection>,
}

fn warn_if_truncated(resource: &str, next_page_token: Option<&str>, returned: usize) {
    if next_page_token.is_some() {
        tracing::warn!(
            resource,
            returned,
            "more results available, only the first page is retrieved"
        );
    }
}

/// Resolves `account` to its channel with a single `channels.list` request.
///
/// If several channels match, the first one in API order is used.
#[instrument(skip(client, fields))]
pub async fn list_channel<C, I, S>(client: &C, account: &str, fields: I) -> Result<Channel>
where
    C: AuthenticatedRequest,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts = fields
        .into_iter()
        .map(|f| f.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",");
    let query = [("part", parts.as_str()), ("forUsername", account)];
    let response: ChannelListResponse = client.get_json("channels", &query).await?;

    tracing::debug!(
        total_results = response.page_info.total_results,
        returned_items = response.items.len(),
        "fetched channels"
    );
    warn_if_truncated(
        "channels",
        response.next_page_token.as_deref(),
        response.items.len(),
    );
    if response.items.len() > 1 {
        tracing::debug!(
            matches = response.items.len(),
            "account matches several channels, using the first"
        );
    }

    let Some(channel) = response.items.into_iter().next() else {
        return Err(Error::NotFound(account.to_string()));
    };
    let view_count = match channel.statistics.and_then(|s| s.view_count) {
        None => 0,
        Some(views) => views.parse::<u64>().map_err(|e| {
            Error::api("channels", format!("malformed viewCount {views:?}: {e}"))
        })?,
    };
    Ok(Channel {
        id: channel.id,
        title: channel.snippet.map(|s| s.title).unwrap_or_default(),
        view_count,
    })
}

/// Lists the playlists owned by `channel`, in API order, without their entries.
#[instrument(skip(client, channel), fields(channel_id = %channel.id))]
pub async fn list_collections<C: AuthenticatedRequest>(
    client: &C,
    channel: &Arc<Channel>,
) -> Result<Vec<Collection>> {
    let query = [("part", PLAYLIST_PARTS), ("channelId", channel.id.as_str())];
    let response: PlaylistListResponse = client.get_json("playlists", &query).await?;

    tracing::debug!(
        total_results = response.page_info.total_results,
        returned_items = response.items.len(),
        "fetched playlists"
    );
    warn_if_truncated(
        "playlists",
        response.next_page_token.as_deref(),
        response.items.len(),
    );

    Ok(response
        .items
        .into_iter()
        .map(|playlist| Collection {
            id: playlist.id,
            title: playlist.snippet.map(|s| s.title).unwrap_or_default(),
            channel: Arc::clone(channel),
            items: Vec::new(),
        })
        .collect())
}

/// Lists the entries of one playlist, in API order.
#[instrument(skip(client))]
pub async fn list_items<C: AuthenticatedRequest>(
    client: &C,
    collection_id: &str,
) -> Result<Vec<Item>> {
    let query = [("part", PLAYLIST_ITEM_PARTS), ("playlistId", collection_id)];
    let response: PlaylistItemListResponse = client.get_json("playlistItems", &query).await?;

    tracing::debug!(
        total_results = response.page_info.total_results,
        returned_items = response.items.len(),
        "fetched playlist items"
    );
    warn_if_truncated(
        "playlistItems",
        response.next_page_token.as_deref(),
        response.items.len(),
    );

    Ok(response
        .items
        .into_iter()
        .map(|entry| Item {
            id: entry.id,
            title: entry.snippet.map(|s| s.title).unwrap_or_default(),
        })
        .collect())
}

/// Extracts the full tree for `query`: the channel, its playlists, and every playlist's
/// entries, one request at a time.
#[instrument(skip(client))]
pub async fn run<C: AuthenticatedRequest>(client: &C, query: &Query) -> Result<Vec<ChannelTree>> {
    let channel = Arc::new(list_channel(client, query.account(), query.fields()).await?);

    let mut collections = Vec::new();
    for collection in list_collections(client, &channel).await? {
        let items = list_items(client, &collection.id).await?;
        collections.push(collection.with_items(items));
    }

    Ok(vec![ChannelTree {
        channel,
        collections,
    }])
}
