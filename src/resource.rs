use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::GeseError;
use crate::fetch::RemoteFetcher;
use crate::store::Store;

/// A JSON document that lives at a remote URL and is mirrored verbatim into the cache.
///
/// Lookup order: cache file (unless refreshing), remote, explicit fallback file,
/// then the well-known local locations from [`CachedJsonResource::fallback_candidates`].
#[derive(Debug, Clone)]
pub struct CachedJsonResource {
    pub url: String,
    pub cache_name: String,
    pub fallback: Option<Utf8PathBuf>,
}

/// Anything parsed from a cached JSON resource must pass this before being accepted.
pub trait Validate {
    fn validate(&self) -> Result<(), GeseError> {
        Ok(())
    }
}

impl CachedJsonResource {
    pub fn new(url: impl Into<String>, cache_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache_name: cache_name.into(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<Utf8PathBuf>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallback_candidates(&self) -> Vec<Utf8PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.fallback {
            candidates.push(path.clone());
        }
        candidates.push(Utf8PathBuf::from(&self.cache_name));
        candidates.push(Utf8PathBuf::from("datasets").join(&self.cache_name));
        candidates.push(Utf8PathBuf::from("..").join("datasets").join(&self.cache_name));
        candidates
    }

    pub fn load<T, F>(&self, store: &Store, fetcher: &F, force_refresh: bool) -> Result<T, GeseError>
    where
        T: DeserializeOwned + Validate,
        F: RemoteFetcher + ?Sized,
    {
        let cache_path = store.path_for(&self.cache_name);

        if !force_refresh && store.exists(&cache_path) {
            match read_json::<T>(&cache_path) {
                Ok(value) => return Ok(value),
                Err(err) => warn!(path = %cache_path, "ignoring unreadable cached {}: {err}", self.cache_name),
            }
        }

        info!("downloading {}", self.cache_name);
        let remote_err = match self.fetch_remote::<T, F>(fetcher) {
            Ok((value, bytes)) => {
                Store::write_bytes_atomic(&cache_path, &bytes)?;
                info!(path = %cache_path, "{} cached", self.cache_name);
                return Ok(value);
            }
            Err(err) => err,
        };
        warn!("failed to download {}: {remote_err}", self.cache_name);

        for candidate in self.fallback_candidates() {
            if !candidate.as_std_path().is_file() {
                continue;
            }
            match read_json::<T>(&candidate) {
                Ok(value) => {
                    info!(path = %candidate, "using local fallback for {}", self.cache_name);
                    return Ok(value);
                }
                Err(err) => warn!(path = %candidate, "unusable fallback: {err}"),
            }
        }

        Err(GeseError::IndexUnavailable {
            resource: self.cache_name.clone(),
            reason: remote_err.to_string(),
        })
    }

    fn fetch_remote<T, F>(&self, fetcher: &F) -> Result<(T, Vec<u8>), GeseError>
    where
        T: DeserializeOwned + Validate,
        F: RemoteFetcher + ?Sized,
    {
        let bytes = fetcher.fetch_bytes(&self.url)?;
        let value = parse_json::<T>(&bytes)?;
        Ok((value, bytes))
    }
}

fn read_json<T: DeserializeOwned + Validate>(path: &Utf8Path) -> Result<T, GeseError> {
    let bytes = Store::read(path)?;
    parse_json(&bytes)
}

fn parse_json<T: DeserializeOwned + Validate>(bytes: &[u8]) -> Result<T, GeseError> {
    let value: T = serde_json::from_slice(bytes).map_err(|err| GeseError::Parse(err.to_string()))?;
    value.validate()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;

    impl Validate for BTreeMap<String, String> {}

    struct Failing {
        calls: Mutex<usize>,
    }

    impl RemoteFetcher for Failing {
        fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, GeseError> {
            *self.calls.lock().unwrap() += 1;
            Err(GeseError::Network("connection refused".to_string()))
        }
    }

    fn temp_store() -> (tempfile::TempDir, Store) {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("cache")).unwrap();
        (temp, Store::new(root))
    }

    #[test]
    fn corrupt_cache_falls_through_to_explicit_fallback() {
        let (temp, store) = temp_store();
        Store::write_bytes_atomic(&store.path_for("aliases.json"), b"{not json").unwrap();
        let fallback = Utf8PathBuf::from_path_buf(temp.path().join("fallback.json")).unwrap();
        std::fs::write(fallback.as_std_path(), br#"{"corn":"maize"}"#).unwrap();

        let fetcher = Failing { calls: Mutex::new(0) };
        let resource = CachedJsonResource::new("http://invalid/aliases.json", "aliases.json")
            .with_fallback(Some(fallback));
        let map: BTreeMap<String, String> = resource.load(&store, &fetcher, false).unwrap();

        assert_eq!(map["corn"], "maize");
        assert_eq!(*fetcher.calls.lock().unwrap(), 1);
    }

    #[test]
    fn fallback_candidates_order() {
        let resource = CachedJsonResource::new("http://invalid/index.json", "index.json")
            .with_fallback(Some(Utf8PathBuf::from("/srv/index.json")));
        assert_eq!(
            resource.fallback_candidates(),
            vec![
                Utf8PathBuf::from("/srv/index.json"),
                Utf8PathBuf::from("index.json"),
                Utf8PathBuf::from("datasets/index.json"),
                Utf8PathBuf::from("../datasets/index.json"),
            ]
        );

        let bare = CachedJsonResource::new("http://invalid/index.json", "index.json");
        assert_eq!(bare.fallback_candidates()[0], Utf8PathBuf::from("index.json"));
        assert_eq!(bare.fallback_candidates().len(), 3);
    }

    #[test]
    fn exhausted_chain_is_unavailable() {
        let (_temp, store) = temp_store();
        let fetcher = Failing { calls: Mutex::new(0) };
        let resource = CachedJsonResource::new("http://invalid/x.json", "no-such-resource-4b1e.json");
        let err = resource
            .load::<BTreeMap<String, String>, _>(&store, &fetcher, true)
            .unwrap_err();
        assert_matches!(err, GeseError::IndexUnavailable { .. });
    }
}
