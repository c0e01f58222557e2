use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use easygese::config::{ConfigFile, ConfigLoader, INDEX_URL};
use easygese::error::GeseError;

fn write_config(temp: &tempfile::TempDir, body: &str) -> String {
    let path = temp.path().join("easygese.json");
    std::fs::write(&path, body).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn explicit_config_file_is_applied() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_config(
        &temp,
        r#"{
            "index_url": "https://mirror.test/datasets/index.json",
            "timeout_secs": 42,
            "index_fallback": "/srv/easygese/index.json"
        }"#,
    );

    let config = ConfigLoader::resolve(Some(&path)).unwrap();
    assert_eq!(config.index_url, "https://mirror.test/datasets/index.json");
    assert_eq!(config.remote_base_url(), "https://mirror.test/datasets/");
    assert_eq!(config.timeout, Duration::from_secs(42));
    assert_eq!(
        config.index_fallback,
        Some(Utf8PathBuf::from("/srv/easygese/index.json"))
    );
    assert_eq!(config.aliases_fallback, None);
}

#[test]
fn missing_explicit_config_is_a_read_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, GeseError::ConfigRead(p) if p == path);
}

#[test]
fn malformed_config_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_config(&temp, r#"{"timeout_secs": "soon"}"#);
    assert_matches!(
        ConfigLoader::resolve(Some(&path)),
        Err(GeseError::ConfigParse(_))
    );
}

#[test]
fn file_cache_dir_applies_without_env_override() {
    let file: ConfigFile = serde_json::from_str(r#"{"cache_dir": "/from/file"}"#).unwrap();
    let config = ConfigLoader::resolve_file(file, None).unwrap();
    assert_eq!(config.cache_dir, Utf8PathBuf::from("/from/file"));
    assert_eq!(config.index_url, INDEX_URL);
}

#[test]
fn env_cache_dir_overrides_file() {
    let file: ConfigFile = serde_json::from_str(r#"{"cache_dir": "/from/file"}"#).unwrap();
    let config = ConfigLoader::resolve_file(file, Some("/from/env".to_string())).unwrap();
    assert_eq!(config.cache_dir, Utf8PathBuf::from("/from/env"));
}
