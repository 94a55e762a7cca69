use crate::{
    app::service::{Connector, FeedService},
    catalog::youtube::YouTubeClient,
    config::Config,
    storage,
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::path::PathBuf;
use std::sync::Arc;

/// Wires config, storage and the YouTube client into a [`FeedService`].
pub struct AppFactory;

impl AppFactory {
    pub fn create_feed_service(paths: &AppPaths) -> Result<FeedService<YouTubeClient>> {
        let config = Config::load_with(&paths.base_path)?;
        let store = Arc::new(
            storage::BackendLocal::new(config.cache_path())
                .context("Failed to open the cache directory")?,
        );

        let api_base_url = config.api_base_url.clone();
        let timeout = config.request_timeout();
        let connect: Connector<YouTubeClient> = Box::new(move |api_key: &str| {
            YouTubeClient::new(&api_base_url, api_key, timeout)
        });

        Ok(FeedService::new(store, config, connect).with_api_key_override(Self::api_key_from_env()))
    }

    /// Get application paths with validation
    pub fn get_paths() -> Result<AppPaths> {
        let base_path = Self::get_base_path()?;

        // Ensure base directory exists
        std::fs::create_dir_all(&base_path)
            .context("Failed to create application base directory")?;

        Ok(AppPaths { base_path })
    }

    /// `MULTIYT_BASE_PATH`, else `~/.local/share/multiyt`
    fn get_base_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var("MULTIYT_BASE_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
        {
            return Ok(PathBuf::from(path));
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;
        Ok(home.join(".local/share/multiyt"))
    }

    fn api_key_from_env() -> Option<String> {
        std::env::var("MULTIYT_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Application paths structure
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_service_uses_cache_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths {
            base_path: tmp.path().to_path_buf(),
        };

        let service = AppFactory::create_feed_service(&paths).unwrap();
        assert!(tmp.path().join("cache").is_dir());
        assert!(tmp.path().join("config.yaml").exists());
        assert!(service.channels().unwrap().is_empty());
    }
}
