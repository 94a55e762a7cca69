use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::catalog::youtube::DEFAULT_API_BASE_URL;

const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_SHARE_BASE_URL: &str = "https://multiyt.local/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 60;
const DEFAULT_PAGE_SIZE: usize = 24;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the YouTube Data API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Page that shared channel links point at
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,

    /// Timeout for a single remote call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How often `watch` re-checks whether a refresh is due
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,

    /// Videos per page in `list`
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            share_base_url: default_share_base_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            watch_interval_secs: DEFAULT_WATCH_INTERVAL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            base_path: PathBuf::new(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_share_base_url() -> String {
    DEFAULT_SHARE_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_watch_interval_secs() -> u64 {
    DEFAULT_WATCH_INTERVAL_SECS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Config {
    fn validate(&mut self) {
        if self.request_timeout_secs == 0 {
            log::warn!("request_timeout_secs must be positive, using {DEFAULT_REQUEST_TIMEOUT_SECS}");
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        if self.watch_interval_secs == 0 {
            log::warn!("watch_interval_secs must be positive, using {DEFAULT_WATCH_INTERVAL_SECS}");
            self.watch_interval_secs = DEFAULT_WATCH_INTERVAL_SECS;
        }
        if self.page_size == 0 {
            self.page_size = 1;
        }
        if url::Url::parse(&self.api_base_url).is_err() {
            log::warn!("api_base_url {:?} is not a url, using default", self.api_base_url);
            self.api_base_url = default_api_base_url();
        }
        if url::Url::parse(&self.share_base_url).is_err() {
            log::warn!("share_base_url {:?} is not a url, using default", self.share_base_url);
            self.share_base_url = default_share_base_url();
        }
    }

    pub fn load_with(base_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)
            .with_context(|| format!("creating {}", base_path.display()))?;
        let config_path = base_path.join(CONFIG_FILE_NAME);

        // create new if does not exist
        if !config_path.exists() {
            let config = Self {
                base_path: base_path.clone(),
                ..Default::default()
            };
            config.save()?;
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path;

        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = self.base_path.join(CONFIG_FILE_NAME);
        let temp_path = self.base_path.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(&temp_path, config_str)?;
        std::fs::rename(&temp_path, &config_path)?;
        Ok(())
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    pub fn cache_path(&self) -> PathBuf {
        self.base_path.join("cache")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_default_config_on_first_load() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_with(tmp.path()).unwrap();

        assert!(tmp.path().join("config.yaml").exists());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.cache_path(), tmp.path().join("cache"));
    }

    #[test]
    fn fills_missing_fields_and_clamps_invalid_ones() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.yaml"),
            "request_timeout_secs: 0\npage_size: 10\nshare_base_url: not a url\n",
        )
        .unwrap();

        let config = Config::load_with(tmp.path()).unwrap();
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.share_base_url, DEFAULT_SHARE_BASE_URL);
        assert_eq!(config.watch_interval_secs, DEFAULT_WATCH_INTERVAL_SECS);

        // upgraded file was written back
        let saved = std::fs::read_to_string(tmp.path().join("config.yaml")).unwrap();
        assert!(saved.contains("watch_interval_secs"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.yaml"), "page_size: [oops").unwrap();
        assert!(Config::load_with(tmp.path()).is_err());
    }
}
