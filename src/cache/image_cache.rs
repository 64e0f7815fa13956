//! Persistent cache for card images
//!
//! Stores images as files in the cache directory, keyed by set code and
//! collector number. Writes go to a temporary file first and are promoted
//! with an atomic rename, so a failed download never leaves a partial file
//! visible to later lookups.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::TcgdexClient;
use crate::error::{CatalogError, Result};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistent cache for card images
pub struct ImageCache {
    cache_dir: PathBuf,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCache {
    /// Create a cache in the platform cache directory
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("poke_catalog")
            .join("images");
        Self::with_dir(cache_dir)
    }

    /// Create a cache rooted at an explicit directory
    pub fn with_dir<P: Into<PathBuf>>(dir: P) -> Self {
        let cache_dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            log::warn!("Failed to create image cache directory: {}", e);
        }
        Self { cache_dir }
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Generate a filename from set code and collector number
    fn filename(set_code: &str, number: &str) -> String {
        format!("{}_{}.jpg", set_code.to_lowercase(), number.to_lowercase())
    }

    /// Get the full path for a cached image
    fn path(&self, set_code: &str, number: &str) -> PathBuf {
        self.cache_dir.join(Self::filename(set_code, number))
    }

    /// Get a cached image path, hit only if the promoted file exists
    pub fn get(&self, set_code: &str, number: &str) -> Option<PathBuf> {
        let path = self.path(set_code, number);
        if path.is_file() {
            log::debug!("Image cache hit for {}/{}", set_code, number);
            Some(path)
        } else {
            None
        }
    }

    /// Store image bytes, returning the promoted path.
    ///
    /// A concurrent writer that finds the file already promoted treats it as
    /// a hit instead of writing again.
    pub fn store(&self, set_code: &str, number: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.path(set_code, number);
        if path.is_file() {
            log::debug!("Image already cached for {}/{}", set_code, number);
            return Ok(path);
        }

        let tmp = self.cache_dir.join(format!(
            ".{}.{}.{}.tmp",
            Self::filename(set_code, number),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed),
        ));

        std::fs::write(&tmp, bytes)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }

        log::debug!("Cached image for {}/{}", set_code, number);
        Ok(path)
    }

    /// Delete all cached files, returning the number of bytes freed
    pub fn clear(&self) -> std::io::Result<u64> {
        let mut freed = 0u64;
        for item in std::fs::read_dir(&self.cache_dir)? {
            let item = item?;
            if item.file_type()?.is_file() {
                freed += item.metadata()?.len();
                std::fs::remove_file(item.path())?;
            }
        }
        Ok(freed)
    }

    /// Total size of the cache in bytes
    pub fn size_bytes(&self) -> u64 {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return 0;
        };
        entries
            .flatten()
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }
}

/// Fetch an image into the cache, returning the local path.
///
/// Cache hits never touch the network; a download failure records nothing,
/// so a later call retries the miss.
pub async fn fetch_image_cached(
    cache: &ImageCache,
    client: &TcgdexClient,
    set_code: &str,
    number: &str,
    url: &str,
) -> Result<PathBuf> {
    if let Some(path) = cache.get(set_code, number) {
        return Ok(path);
    }

    log::info!(
        "Image cache miss for {}/{}, fetching from card database",
        set_code,
        number
    );
    let bytes = client.fetch_image(url).await?;

    cache
        .store(set_code, number, &bytes)
        .map_err(|e| CatalogError::ImageDownloadFailed(format!("cache write: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> (ImageCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = ImageCache::with_dir(temp_dir.path());
        (cache, temp_dir)
    }

    #[test]
    fn test_filename_format() {
        assert_eq!(ImageCache::filename("SV01", "57"), "sv01_57.jpg");
        assert_eq!(ImageCache::filename("sv08.5", "131"), "sv08.5_131.jpg");
    }

    #[test]
    fn test_get_nonexistent_returns_none() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(cache.get("sv01", "999").is_none());
    }

    #[test]
    fn test_store_and_get() {
        let (cache, _temp_dir) = create_test_cache();
        let test_data = vec![0xFF, 0xD8, 0xFF]; // JPEG magic bytes

        let stored = cache.store("sv01", "57", &test_data).unwrap();
        let retrieved = cache.get("sv01", "57").unwrap();

        assert_eq!(stored, retrieved);
        assert_eq!(std::fs::read(&retrieved).unwrap(), test_data);
    }

    #[test]
    fn test_store_existing_key_is_a_hit() {
        let (cache, _temp_dir) = create_test_cache();

        cache.store("sv01", "1", &[1, 2, 3]).unwrap();
        // second writer must not overwrite the promoted file
        cache.store("sv01", "1", &[9, 9, 9]).unwrap();

        let path = cache.get("sv01", "1").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (cache, temp_dir) = create_test_cache();
        cache.store("sv01", "2", &[5, 5]).unwrap();

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sv01_2.jpg".to_string()]);
    }

    #[test]
    fn test_get_case_insensitive_set_code() {
        let (cache, _temp_dir) = create_test_cache();
        cache.store("SV01", "57", &[1]).unwrap();

        assert!(cache.get("sv01", "57").is_some());
        assert!(cache.get("Sv01", "57").is_some());
    }

    #[test]
    fn test_cache_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = ImageCache::with_dir(temp_dir.path());
            cache.store("sv01", "57", &[10, 20, 30]).unwrap();
        }
        {
            let cache = ImageCache::with_dir(temp_dir.path());
            let path = cache.get("sv01", "57").unwrap();
            assert_eq!(std::fs::read(path).unwrap(), vec![10, 20, 30]);
        }
    }

    #[test]
    fn test_clear_reports_bytes_freed() {
        let (cache, _temp_dir) = create_test_cache();
        cache.store("sv01", "1", &[0; 100]).unwrap();
        cache.store("sv01", "2", &[0; 50]).unwrap();
        assert_eq!(cache.size_bytes(), 150);

        let freed = cache.clear().unwrap();
        assert_eq!(freed, 150);
        assert!(cache.get("sv01", "1").is_none());
        assert_eq!(cache.size_bytes(), 0);
    }

    #[tokio::test]
    async fn test_fetch_image_cached_skips_network_on_hit() {
        let (cache, _temp_dir) = create_test_cache();
        cache.store("sv01", "57", &[1, 2, 3]).unwrap();

        // unroutable base URL: any network attempt would fail
        let client = TcgdexClient::with_base_url("http://127.0.0.1:1");
        let path = fetch_image_cached(&cache, &client, "sv01", "57", "http://127.0.0.1:1/img")
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
