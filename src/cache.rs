use std::collections::HashMap;

use crate::youtube::{SortMode, Video};

/// In-memory cache of fetched search results so a repeated query won't
/// hit the network again. Keyed by the exact query string plus the sort
/// mode it was fetched under; no normalization, so "react " and "react"
/// are distinct entries. Entries are never evicted or expired — the
/// process is short-lived and entries are small.
#[derive(Default)]
pub struct SearchCache {
  entries: HashMap<(String, SortMode), Vec<Video>>,
}

impl SearchCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, query: &str, sort: SortMode) -> Option<&[Video]> {
    self.entries.get(&(query.to_string(), sort)).map(Vec::as_slice)
  }

  pub fn insert(&mut self, query: String, sort: SortMode, videos: Vec<Video>) {
    self.entries.insert((query, sort), videos);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn video(id: &str) -> Video {
    Video {
      video_id: id.to_string(),
      title: format!("video {id}"),
      description: String::new(),
      channel_title: "chan".to_string(),
      published_at: "2024-01-01T00:00:00Z".to_string(),
      thumbnail_url: String::new(),
      view_count: None,
      like_count: None,
    }
  }

  #[test]
  fn miss_then_hit() {
    let mut cache = SearchCache::new();
    assert!(cache.get("rust", SortMode::MostPopular).is_none());
    cache.insert("rust".to_string(), SortMode::MostPopular, vec![video("a"), video("b")]);
    let hit = cache.get("rust", SortMode::MostPopular).unwrap();
    assert_eq!(hit.len(), 2);
    assert_eq!(hit[0].video_id, "a");
  }

  #[test]
  fn key_includes_sort_mode() {
    let mut cache = SearchCache::new();
    cache.insert("rust".to_string(), SortMode::MostPopular, vec![video("a")]);
    // Same query under a different sort is a separate entry.
    assert!(cache.get("rust", SortMode::Newest).is_none());
    cache.insert("rust".to_string(), SortMode::Newest, vec![video("b")]);
    assert_eq!(cache.get("rust", SortMode::MostPopular).unwrap()[0].video_id, "a");
    assert_eq!(cache.get("rust", SortMode::Newest).unwrap()[0].video_id, "b");
  }

  #[test]
  fn key_is_exact_string() {
    let mut cache = SearchCache::new();
    cache.insert("react".to_string(), SortMode::MostPopular, vec![video("a")]);
    assert!(cache.get("react ", SortMode::MostPopular).is_none());
    assert!(cache.get("React", SortMode::MostPopular).is_none());
  }

  #[test]
  fn insert_overwrites_same_key() {
    let mut cache = SearchCache::new();
    cache.insert("q".to_string(), SortMode::Newest, vec![video("old")]);
    cache.insert("q".to_string(), SortMode::Newest, vec![video("new")]);
    assert_eq!(cache.get("q", SortMode::Newest).unwrap()[0].video_id, "new");
  }
}
