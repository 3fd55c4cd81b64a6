use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::constants::constants;

/// User-selectable result ordering, mapped onto the API `order` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortMode {
  #[default]
  MostPopular,
  Newest,
  Oldest,
}

impl SortMode {
  pub const ALL: [SortMode; 3] = [SortMode::MostPopular, SortMode::Newest, SortMode::Oldest];

  pub fn label(self) -> &'static str {
    match self {
      SortMode::MostPopular => "Most popular",
      SortMode::Newest => "Upload date: newest",
      SortMode::Oldest => "Upload date: oldest",
    }
  }

  /// The `order` parameter sent to the search endpoint. The API only orders
  /// by date descending, so `Oldest` reuses `date` and the caller reverses.
  pub fn api_order(self) -> &'static str {
    match self {
      SortMode::MostPopular => "viewCount",
      SortMode::Newest | SortMode::Oldest => "date",
    }
  }

  pub fn next(self) -> Self {
    let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }
}

/// A video as displayed: the search snippet, plus statistics once the
/// second endpoint has been consulted.
#[derive(Debug, Clone)]
pub struct Video {
  pub video_id: String,
  pub title: String,
  pub description: String,
  pub channel_title: String,
  /// RFC 3339 timestamp as returned by the API.
  pub published_at: String,
  pub thumbnail_url: String,
  /// Display strings as returned by the API; absent until statistics are merged.
  pub view_count: Option<String>,
  pub like_count: Option<String>,
}

impl Video {
  pub fn watch_url(&self) -> String {
    format!("https://www.youtube.com/watch?v={}", self.video_id)
  }
}

// --- Wire models ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  id: SearchItemId,
  snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
  #[serde(rename = "videoId")]
  video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
  #[serde(default)]
  title: String,
  #[serde(default)]
  description: String,
  #[serde(rename = "channelTitle", default)]
  channel_title: String,
  #[serde(rename = "publishedAt", default)]
  published_at: String,
  #[serde(default)]
  thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
  high: Option<Thumbnail>,
  medium: Option<Thumbnail>,
  default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
  url: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
  #[serde(default)]
  items: Vec<StatsItem>,
}

#[derive(Debug, Deserialize)]
struct StatsItem {
  id: String,
  statistics: Option<Statistics>,
}

#[derive(Debug, Default, Deserialize)]
struct Statistics {
  #[serde(rename = "viewCount")]
  view_count: Option<String>,
  #[serde(rename = "likeCount")]
  like_count: Option<String>,
}

// --- Response assembly ---

/// Flatten a search response, dropping items without a video id
/// (the endpoint can also return channels and playlists).
fn collect_search_items(response: SearchResponse) -> Vec<Video> {
  response
    .items
    .into_iter()
    .filter_map(|item| {
      let video_id = item.id.video_id?;
      let thumbs = item.snippet.thumbnails;
      let thumbnail_url = thumbs
        .high
        .or(thumbs.medium)
        .or(thumbs.default)
        .map(|t| t.url)
        .unwrap_or_default();
      Some(Video {
        video_id,
        title: item.snippet.title,
        description: item.snippet.description,
        channel_title: item.snippet.channel_title,
        published_at: item.snippet.published_at,
        thumbnail_url,
        view_count: None,
        like_count: None,
      })
    })
    .collect()
}

/// Attach statistics to search results, matched by video id.
/// Ids missing from the statistics response keep their counts absent.
fn merge_statistics(videos: &mut [Video], response: VideosResponse) {
  let mut by_id: HashMap<String, Statistics> =
    response.items.into_iter().map(|item| (item.id, item.statistics.unwrap_or_default())).collect();
  for video in videos.iter_mut() {
    if let Some(stats) = by_id.remove(&video.video_id) {
      video.view_count = stats.view_count;
      video.like_count = stats.like_count;
    }
  }
}

// --- API calls ---

/// Run the two-call fetch protocol: search by keyword, then statistics for
/// the returned ids, merged into one list. `Oldest` is reversed locally
/// since the API has no ascending date order.
pub async fn search_videos(
  client: &Client,
  api_key: &str,
  query: &str,
  sort: SortMode,
  max_results: u32,
) -> Result<Vec<Video>> {
  if api_key.is_empty() {
    return Err(anyhow!("No YouTube API key. Set {} or add api_key to prefs.toml", constants().api_key_env));
  }

  let max_results = max_results.to_string();
  let response = client
    .get(constants().search_endpoint.as_str())
    .query(&[
      ("part", "snippet"),
      ("q", query),
      ("type", "video"),
      ("order", sort.api_order()),
      ("maxResults", max_results.as_str()),
      ("key", api_key),
    ])
    .send()
    .await
    .context("Search request failed")?
    .error_for_status()
    .context("Search request rejected")?
    .json::<SearchResponse>()
    .await
    .context("Failed to decode search response")?;

  let mut videos = collect_search_items(response);
  debug!(query = %query, order = sort.api_order(), count = videos.len(), "search returned");

  let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
  if !ids.is_empty() {
    let joined_ids = ids.join(",");
    let stats = client
      .get(constants().videos_endpoint.as_str())
      .query(&[("part", "statistics"), ("id", joined_ids.as_str()), ("key", api_key)])
      .send()
      .await
      .context("Statistics request failed")?
      .error_for_status()
      .context("Statistics request rejected")?
      .json::<VideosResponse>()
      .await
      .context("Failed to decode statistics response")?;
    merge_statistics(&mut videos, stats);
  }

  if sort == SortMode::Oldest {
    videos.reverse();
  }
  Ok(videos)
}
