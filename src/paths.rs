/// Filesystem locations used by the app.
///
/// Configuration lives next to the working directory so `cargo run` picks up
/// a local `weather_diorama.toml`. Downloaded models and fonts go to the
/// platform cache directory and are exposed to Bevy as the `cache://` asset
/// source.

use std::path::{Path, PathBuf};

/// Directory name used under the platform cache directory.
pub const APP_DIR: &str = "weather_diorama";

/// Asset source id under which the cache directory is registered.
pub const CACHE_SOURCE: &str = "cache";

/// Configuration directory (the current working directory).
pub fn config_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Root of the download cache.
///
/// - **Linux**: `~/.cache/weather_diorama/`
/// - **macOS**: `~/Library/Caches/weather_diorama/`
/// - **Windows**: `%LOCALAPPDATA%\weather_diorama\`
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(APP_DIR)
}

/// Bevy asset path for a file stored under [`cache_dir`].
pub fn cache_asset_path(relative: &Path) -> String {
    // Asset paths always use forward slashes regardless of platform.
    let rel = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}://{}", CACHE_SOURCE, rel)
}

/// Ensure a directory exists, creating it and all parents if necessary.
/// Returns the path unchanged for chaining.
pub fn ensure_dir(path: &Path) -> &Path {
    let _ = std::fs::create_dir_all(path);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_cwd() {
        let config = config_dir();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(config, cwd);
    }

    #[test]
    fn test_cache_dir_ends_with_app_dir() {
        assert!(cache_dir().ends_with(APP_DIR));
    }

    #[test]
    fn test_cache_asset_path_uses_cache_source() {
        let path = cache_asset_path(&Path::new("models").join("SUN.glb"));
        assert_eq!(path, "cache://models/SUN.glb");
    }

    #[test]
    fn test_ensure_dir_creates_nested_directories() {
        let root = std::env::temp_dir().join(format!("wd-paths-{}", std::process::id()));
        let nested = root.join("a").join("b");
        assert_eq!(ensure_dir(&nested), nested.as_path());
        assert!(nested.is_dir());
        let _ = std::fs::remove_dir_all(&root);
    }
}
