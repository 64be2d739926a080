//! Remote asset downloads into the local cache.
//!
//! Bevy only reads from asset sources, so each remote model or font is first
//! copied into the cache directory and then loaded through `cache://`.

use bevy::prelude::*;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::paths;

/// Cache subdirectory for glTF models.
pub const MODELS_DIR: &str = "models";
/// Cache subdirectory for fonts.
pub const FONTS_DIR: &str = "fonts";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),
    #[error("cache write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid asset url: {0}")]
    InvalidUrl(String),
    #[error("{0} was not started")]
    NotStarted(String),
}

/// Makes a remote asset available under the cache root.
pub trait AssetFetcher: Send + Sync + 'static {
    /// Fetch `url` into `subdir` and return its path relative to the cache
    /// root.
    fn fetch(&self, url: &str, subdir: &str) -> Result<PathBuf, FetchError>;
}

#[derive(Resource, Clone)]
pub struct AssetFetcherHandle(pub Arc<dyn AssetFetcher>);

/// Length of the URL digest prefix on cached file names.
const KEY_HEX_LEN: usize = 16;

/// Hex SHA-256 prefix of the full URL, query string included.
fn url_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest[..KEY_HEX_LEN / 2].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Cache-relative path for `url`: `<subdir>/<url key>-<last path segment>`.
///
/// The key covers the whole URL, so two URLs that share a file name never
/// share a cache entry. The original file name stays last so loaders still
/// pick by extension.
pub fn cache_relative_path(url: &str, subdir: &str) -> Result<PathBuf, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
    let file_name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .ok_or_else(|| FetchError::InvalidUrl(format!("{}: no file name", url)))?;
    Ok(Path::new(subdir).join(format!("{}-{}", url_key(url), file_name)))
}

/// Write `bytes` to `root/relative` through a private temp file in the same
/// directory. Concurrent writers of one entry each get their own temp file,
/// and an unpersisted temp file is removed when dropped.
fn store_in_cache(root: &Path, relative: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let path = root.join(relative);
    let dir = path.parent().unwrap_or(root).to_path_buf();
    paths::ensure_dir(&dir);

    let mut partial = tempfile::NamedTempFile::new_in(&dir)?;
    partial.write_all(bytes)?;
    match partial.persist(&path) {
        Ok(_) => Ok(()),
        // Another download of the same URL finished first
        Err(_) if path.exists() => Ok(()),
        Err(e) => Err(FetchError::Io(e.error)),
    }
}

/// Downloads over HTTP with a blocking reqwest client. Files already in the
/// cache are reused without a request.
pub struct HttpAssetFetcher {
    client: reqwest::blocking::Client,
    root: PathBuf,
}

impl HttpAssetFetcher {
    pub fn new(root: PathBuf, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, root })
    }
}

impl AssetFetcher for HttpAssetFetcher {
    fn fetch(&self, url: &str, subdir: &str) -> Result<PathBuf, FetchError> {
        let relative = cache_relative_path(url, subdir)?;
        let path = self.root.join(&relative);
        if path.exists() {
            debug!("Using cached {:?}", path);
            return Ok(relative);
        }

        info!("Downloading {}", url);
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let bytes = response.bytes()?;

        store_in_cache(&self.root, &relative, &bytes)?;

        info!("Downloaded {:?} ({} bytes)", relative, bytes.len());
        Ok(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_keeps_file_name_last() {
        let rel = cache_relative_path("https://dogmandcl.github.io/modelingResources/SUN.glb", MODELS_DIR).unwrap();
        assert_eq!(rel.parent(), Some(Path::new("models")));
        let name = rel.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-SUN.glb"), "{}", name);
        assert_eq!(name.len(), KEY_HEX_LEN + "-SUN.glb".len());
        assert_eq!(rel.extension().and_then(|e| e.to_str()), Some("glb"));
    }

    #[test]
    fn relative_path_is_stable_per_url() {
        let url = "https://example.com/fonts/Fira.ttf?raw=true";
        assert_eq!(
            cache_relative_path(url, FONTS_DIR).unwrap(),
            cache_relative_path(url, FONTS_DIR).unwrap()
        );
        let rel = cache_relative_path(url, FONTS_DIR).unwrap();
        assert!(rel.to_string_lossy().ends_with("-Fira.ttf"));
    }

    #[test]
    fn same_file_name_on_different_urls_gets_separate_entries() {
        let original = cache_relative_path("https://dogmandcl.github.io/modelingResources/SUN.glb", MODELS_DIR).unwrap();
        let moved = cache_relative_path("https://other.host/v2/SUN.glb", MODELS_DIR).unwrap();
        let query = cache_relative_path("https://dogmandcl.github.io/modelingResources/SUN.glb?v=2", MODELS_DIR).unwrap();
        assert_ne!(original, moved);
        assert_ne!(original, query);
        assert_ne!(moved, query);
    }

    #[test]
    fn url_without_file_name_is_rejected() {
        assert!(matches!(
            cache_relative_path("https://example.com/", MODELS_DIR),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            cache_relative_path("not a url", MODELS_DIR),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn cached_file_is_served_without_network() {
        let root = tempfile::tempdir().unwrap();
        let url = "http://127.0.0.1:9/assets/rain.glb";
        let expected = cache_relative_path(url, MODELS_DIR).unwrap();
        std::fs::create_dir_all(root.path().join(MODELS_DIR)).unwrap();
        std::fs::write(root.path().join(&expected), b"glTF").unwrap();

        // Unroutable host: a network attempt would fail the test.
        let fetcher = HttpAssetFetcher::new(root.path().to_path_buf(), "test-agent").unwrap();
        assert_eq!(fetcher.fetch(url, MODELS_DIR).unwrap(), expected);
    }

    #[test]
    fn concurrent_stores_of_one_entry_all_succeed() {
        let root = tempfile::tempdir().unwrap();
        let relative = cache_relative_path("https://example.com/big.glb", MODELS_DIR).unwrap();
        let payload = vec![7u8; 1 << 20];

        for _ in 0..20 {
            let _ = std::fs::remove_file(root.path().join(&relative));
            let barrier = Arc::new(std::sync::Barrier::new(4));
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let root = root.path().to_path_buf();
                    let relative = relative.clone();
                    let payload = payload.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        store_in_cache(&root, &relative, &payload)
                    })
                })
                .collect();

            for handle in handles {
                assert!(handle.join().unwrap().is_ok());
            }
            assert_eq!(std::fs::read(root.path().join(&relative)).unwrap(), payload);
        }

        // Only the finished entry remains; no temp files are left behind.
        let entries: Vec<_> = std::fs::read_dir(root.path().join(MODELS_DIR))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries, vec![root.path().join(&relative)]);
    }
}
