#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use camino::Utf8PathBuf;

use easygese::app::App;
use easygese::config::Config;
use easygese::error::GeseError;
use easygese::fetch::RemoteFetcher;

pub const BASE: &str = "https://example.test/datasets/";
pub const INDEX_URL: &str = "https://example.test/datasets/index.json";
pub const ALIASES_URL: &str = "https://example.test/datasets/species_aliases.json";

pub const INDEX_JSON: &str = r#"{
    "bean": {"X": "https://example.test/u1", "Y": "https://example.test/u2",
             "Z": "https://example.test/u3", "citation": "cite",
             "metadata": {"n_markers": 3, "n_genotypes": 2, "n_traits": 2}},
    "wheatG": {"X": "https://example.test/w1", "Y": "https://example.test/w2",
               "Z": "https://example.test/w3"}
}"#;

pub const ALIASES_JSON: &str = r#"{"beans": "bean", "common bean": "bean", "wheat": "wheatG"}"#;

pub const X_CSV: &str = "\
,m1,m2,m3
g1,0,1,2
g2,2,1,0
";

pub const Y_CSV: &str = "\
,DF,YLD
g1,41,2.5
g2,44,
";

pub const Z_JSON: &str = r#"{
    "DF": {"g1": {"Split1CV1": 1, "Split1CV2": 0}, "g2": {"Split1CV1": 0, "Split1CV2": 1}},
    "YLD": {"g1": {"Split1CV1": 0, "Split1CV2": 1}, "g2": {"Split1CV1": 1, "Split1CV2": 0}}
}"#;

// Serves canned bodies by URL and records every request.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn with_species(self) -> Self {
        self.with(INDEX_URL, INDEX_JSON)
            .with(ALIASES_URL, ALIASES_JSON)
            .with("https://example.test/u1", X_CSV)
            .with("https://example.test/u2", Y_CSV)
            .with("https://example.test/u3", Z_JSON)
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| *called == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl RemoteFetcher for MockFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, GeseError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| GeseError::NetworkStatus {
                url: url.to_string(),
                status: 404,
                message: "not found".to_string(),
            })
    }
}

pub fn test_config(temp: &tempfile::TempDir) -> Config {
    let cache_dir = Utf8PathBuf::from_path_buf(temp.path().join("cache")).unwrap();
    let mut config = Config::with_cache_dir(cache_dir);
    config.index_url = INDEX_URL.to_string();
    config.aliases_url = ALIASES_URL.to_string();
    config
}

pub fn test_app(temp: &tempfile::TempDir, fetcher: MockFetcher) -> App<MockFetcher> {
    App::new(test_config(temp), fetcher)
}
