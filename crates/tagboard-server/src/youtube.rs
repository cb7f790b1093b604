//! YouTube Data API v3 channel lookup.
//!
//! A handle resolves in two requests: a channel search to find the channel
//! id, then a `channels` fetch for its title and description.

use std::time::Duration;

use anyhow::Context as _;
use reqwest::{Client, Url};
use serde::Deserialize;
use tagboard_core::upstream::{ChannelDirectory, ChannelMetadata, LookupError};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3/";

pub struct YouTubeDirectory {
  client:  Client,
  api_key: String,
  base:    Url,
}

#[derive(Deserialize)]
struct SearchResponse {
  #[serde(default)]
  items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
  id: SearchId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
  channel_id: Option<String>,
}

#[derive(Deserialize)]
struct ChannelsResponse {
  #[serde(default)]
  items: Vec<ChannelItem>,
}

#[derive(Deserialize)]
struct ChannelItem {
  snippet: Snippet,
}

#[derive(Deserialize)]
struct Snippet {
  title:       String,
  #[serde(default)]
  description: String,
}

impl YouTubeDirectory {
  pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
    Self::with_base(api_key, Url::parse(API_BASE).context("YouTube API base")?, timeout)
  }

  /// Point the directory at another API root, which must end in `/`.
  pub fn with_base(api_key: String, base: Url, timeout: Duration) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      api_key,
      base,
    })
  }

  fn endpoint(&self, name: &str) -> Result<Url, LookupError> {
    self
      .base
      .join(name)
      .map_err(|e| LookupError::Transport(e.to_string()))
  }

  async fn find_channel_id(&self, handle: &str) -> Result<String, LookupError> {
    let resp = self
      .client
      .get(self.endpoint("search")?)
      .query(&[
        ("part", "snippet"),
        ("type", "channel"),
        ("q", handle),
        ("key", self.api_key.as_str()),
      ])
      .send()
      .await
      .map_err(|e| LookupError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(LookupError::Transport(format!("channel search → {}", resp.status())));
    }
    let found: SearchResponse = resp
      .json()
      .await
      .map_err(|e| LookupError::Transport(e.to_string()))?;

    found
      .items
      .into_iter()
      .find_map(|item| item.id.channel_id)
      .ok_or_else(|| LookupError::NotFound(handle.to_owned()))
  }

  async fn fetch_details(&self, channel_ref: String) -> Result<ChannelMetadata, LookupError> {
    let failed = |reason: String| LookupError::DetailsFetch {
      channel_ref: channel_ref.clone(),
      reason,
    };

    let resp = self
      .client
      .get(self.endpoint("channels")?)
      .query(&[
        ("part", "snippet"),
        ("id", channel_ref.as_str()),
        ("key", self.api_key.as_str()),
      ])
      .send()
      .await
      .map_err(|e| failed(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(failed(format!("channels → {}", resp.status())));
    }
    let details: ChannelsResponse = resp.json().await.map_err(|e| failed(e.to_string()))?;
    let Some(item) = details.items.into_iter().next() else {
      return Err(failed("no channel in response".into()));
    };

    Ok(ChannelMetadata {
      channel_ref,
      display_name: item.snippet.title,
      description: item.snippet.description,
    })
  }
}

impl ChannelDirectory for YouTubeDirectory {
  async fn lookup(&self, handle: &str) -> Result<ChannelMetadata, LookupError> {
    let channel_ref = self.find_channel_id(handle).await?;
    tracing::debug!(handle, %channel_ref, "channel handle resolved");
    self.fetch_details(channel_ref).await
  }
}
