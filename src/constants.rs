//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available —
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  /// Home screen category rails, fetched in this order.
  pub categories: Vec<String>,

  // Search
  pub debounce_ms: u64,
  pub max_results: u32,
  pub home_fetch_concurrency: usize,

  // YouTube Data API v3
  pub search_endpoint: String,
  pub videos_endpoint: String,
  pub api_key_env: String,

  // Notes
  pub notes_file_prefix: String,

  // Settings
  pub reminder_repeat_time: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_ron_parses() {
    let c = constants();
    assert_eq!(c.categories.len(), 4);
    assert!(c.debounce_ms > 0);
    assert!(c.search_endpoint.starts_with("https://"));
  }
}
