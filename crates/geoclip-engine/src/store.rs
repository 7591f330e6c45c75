//! Object store resolution and the shared handle cache.
//!
//! Dataset locators are plain paths or URLs. Each (scheme, authority,
//! credential) triple maps to one long-lived [`ObjectStore`] client so that
//! repeated extractions against the same host reuse its connection pool. The
//! cache is process wide and never evicts; the set of distinct stores in a
//! run is small.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, RwLock};

use object_store::path::Path as StorePath;
use object_store::{parse_url, ObjectStore};
use url::Url;

use geoclip_core::{GeoclipError, Result};

static STORE_CACHE: OnceLock<RwLock<HashMap<String, Arc<dyn ObjectStore>>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<String, Arc<dyn ObjectStore>>> {
    STORE_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Turn a locator into a URL. Bare paths become `file://` URLs relative to
/// the current directory; the file does not have to exist yet.
pub fn locator_url(locator: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(locator) {
        // Single-letter schemes are Windows drive prefixes, not URLs.
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }
    let path = std::env::current_dir()?.join(locator);
    Url::from_file_path(&path).map_err(|_| GeoclipError::SourceUnreachable {
        locator: locator.to_string(),
        reason: "locator is neither a URL nor a usable path".to_string(),
    })
}

/// Cache key: scheme + authority + a hash of the credentials in scope, so a
/// credential rotation yields a fresh client instead of a stale one.
fn cache_key(url: &Url) -> String {
    let mut hasher = DefaultHasher::new();
    if url.scheme() == "s3" {
        std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default().hash(&mut hasher);
        std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default().hash(&mut hasher);
        std::env::var("AWS_REGION").unwrap_or_default().hash(&mut hasher);
    }
    format!(
        "{}://{}#{:x}",
        url.scheme(),
        url.authority(),
        hasher.finish()
    )
}

/// Resolve a locator to a store handle and the object path within it.
pub fn resolve(locator: &str) -> Result<(Arc<dyn ObjectStore>, StorePath)> {
    let url = locator_url(locator)?;
    let (store, path) = parse_url(&url).map_err(|e| GeoclipError::SourceUnreachable {
        locator: locator.to_string(),
        reason: e.to_string(),
    })?;

    let key = cache_key(&url);
    if let Ok(guard) = cache().read() {
        if let Some(hit) = guard.get(&key) {
            return Ok((Arc::clone(hit), path));
        }
    }
    let store: Arc<dyn ObjectStore> = Arc::from(store);
    if let Ok(mut guard) = cache().write() {
        // A racing writer may have inserted first; keep whichever is in.
        let entry = guard.entry(key).or_insert_with(|| Arc::clone(&store));
        return Ok((Arc::clone(entry), path));
    }
    Ok((store, path))
}

/// Fetch an object's full contents.
pub async fn fetch(locator: &str) -> Result<Vec<u8>> {
    let (store, path) = resolve(locator)?;
    tracing::debug!(locator, "fetching object");
    let result = store
        .get(&path)
        .await
        .map_err(|e| GeoclipError::SourceUnreachable {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;
    let bytes = result
        .bytes()
        .await
        .map_err(|e| GeoclipError::SourceUnreachable {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_locator_url_for_bare_path() {
        let url = locator_url("data/wetlands.geojson").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/data/wetlands.geojson"));
    }

    #[test]
    fn test_locator_url_passthrough() {
        let url = locator_url("s3://bucket/key.shp").unwrap();
        assert_eq!(url.scheme(), "s3");
        assert_eq!(url.authority(), "bucket");
    }

    #[test]
    fn test_cache_key_separates_authorities() {
        let a = cache_key(&Url::parse("https://host-a/x").unwrap());
        let b = cache_key(&Url::parse("https://host-b/x").unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve_reuses_handle() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.geojson");
        std::fs::File::create(&file).unwrap().write_all(b"{}").unwrap();

        let locator = file.to_string_lossy().to_string();
        let (first, _) = resolve(&locator).unwrap();
        let (second, _) = resolve(&locator).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("b.txt");
        std::fs::write(&file, b"hello").unwrap();

        let bytes = fetch(&file.to_string_lossy()).await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_fetch_missing_is_unreachable() {
        let err = fetch("/definitely/not/here.geojson").await.unwrap_err();
        assert!(matches!(err, GeoclipError::SourceUnreachable { .. }));
    }
}
