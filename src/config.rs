use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::constants;

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
  pub theme_name: Option<String>,
  pub api_key: Option<String>,
  pub reminder_enabled: bool,
  pub reminder_time: Option<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self { theme_name: None, api_key: None, reminder_enabled: true, reminder_time: None }
  }
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "devtube") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "devtube") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Resolve the YouTube API key: CLI flag wins, then the environment, then the config file.
  pub fn resolve_api_key(&self, cli_key: Option<&str>) -> Option<String> {
    if let Some(key) = cli_key
      && !key.is_empty()
    {
      return Some(key.to_string());
    }
    if let Ok(key) = std::env::var(&constants().api_key_env)
      && !key.is_empty()
    {
      return Some(key);
    }
    self.api_key.clone()
  }

  /// The daily reminder time shown on the settings screen.
  pub fn repeat_time(&self) -> &str {
    self.reminder_time.as_deref().unwrap_or(&constants().reminder_repeat_time)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_has_reminder_on() {
    let config = Config::default();
    assert!(config.reminder_enabled);
    assert!(config.api_key.is_none());
  }

  #[test]
  fn cli_key_wins_over_config() {
    let config = Config { api_key: Some("from-config".to_string()), ..Config::default() };
    assert_eq!(config.resolve_api_key(Some("from-cli")).as_deref(), Some("from-cli"));
  }

  #[test]
  fn empty_cli_key_falls_through() {
    let config = Config { api_key: Some("from-config".to_string()), ..Config::default() };
    // An empty flag value should not shadow the configured key.
    assert_eq!(config.resolve_api_key(Some("")).as_deref(), Some("from-config"));
  }

  #[test]
  fn repeat_time_defaults_from_constants() {
    let config = Config::default();
    assert_eq!(config.repeat_time(), "12:00");
    let custom = Config { reminder_time: Some("08:30".to_string()), ..Config::default() };
    assert_eq!(custom.repeat_time(), "08:30");
  }

  #[test]
  fn roundtrips_through_toml() {
    let config = Config {
      theme_name: Some("paper".to_string()),
      api_key: None,
      reminder_enabled: false,
      reminder_time: Some("09:00".to_string()),
    };
    let text = toml::to_string(&config).unwrap();
    let back: Config = toml::from_str(&text).unwrap();
    assert_eq!(back.theme_name.as_deref(), Some("paper"));
    assert!(!back.reminder_enabled);
    assert_eq!(back.reminder_time.as_deref(), Some("09:00"));
  }
}
