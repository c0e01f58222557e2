use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::GeseError;

pub const INDEX_URL: &str =
    "https://raw.githubusercontent.com/cquesadat/EasyGeSe/main/datasets/index.json";
pub const SPECIES_ALIASES_URL: &str =
    "https://raw.githubusercontent.com/cquesadat/EasyGeSe/main/datasets/species_aliases.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const CACHE_DIR_ENV: &str = "EASYGESE_CACHE_DIR";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub index_url: Option<String>,
    #[serde(default)]
    pub aliases_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub index_fallback: Option<String>,
    #[serde(default)]
    pub aliases_fallback: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_dir: Utf8PathBuf,
    pub index_url: String,
    pub aliases_url: String,
    pub timeout: Duration,
    pub index_fallback: Option<Utf8PathBuf>,
    pub aliases_fallback: Option<Utf8PathBuf>,
}

impl Config {
    pub fn with_cache_dir(cache_dir: Utf8PathBuf) -> Self {
        Self {
            cache_dir,
            index_url: INDEX_URL.to_string(),
            aliases_url: SPECIES_ALIASES_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            index_fallback: None,
            aliases_fallback: None,
        }
    }

    pub fn remote_base_url(&self) -> String {
        match self.index_url.rfind('/') {
            Some(pos) => self.index_url[..=pos].to_string(),
            None => format!("{}/", self.index_url),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<Config, GeseError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("easygese.json"),
        };

        let file = if path.is_none() && !config_path.exists() {
            ConfigFile::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| GeseError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| GeseError::ConfigParse(err.to_string()))?
        };

        let env_cache_dir = std::env::var(CACHE_DIR_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::resolve_file(file, env_cache_dir)
    }

    pub fn resolve_file(
        file: ConfigFile,
        env_cache_dir: Option<String>,
    ) -> Result<Config, GeseError> {
        let cache_dir = match env_cache_dir.or(file.cache_dir) {
            Some(dir) => Utf8PathBuf::from(dir),
            None => default_cache_dir()?,
        };

        let mut config = Config::with_cache_dir(cache_dir);
        if let Some(url) = file.index_url {
            config.index_url = url;
        }
        if let Some(url) = file.aliases_url {
            config.aliases_url = url;
        }
        if let Some(secs) = file.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config.index_fallback = file.index_fallback.map(Utf8PathBuf::from);
        config.aliases_fallback = file.aliases_fallback.map(Utf8PathBuf::from);
        Ok(config)
    }
}

pub fn default_cache_dir() -> Result<Utf8PathBuf, GeseError> {
    ProjectDirs::from("", "easygese", "easygese")
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.cache_dir().to_path_buf()).ok())
        .ok_or_else(|| GeseError::Filesystem("unable to resolve cache directory".to_string()))
}
