use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::GeseError;

pub trait RemoteFetcher: Send + Sync {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, GeseError>;

    fn fetch_text(&self, url: &str) -> Result<String, GeseError> {
        let bytes = self.fetch_bytes(url)?;
        String::from_utf8(bytes)
            .map_err(|err| GeseError::Parse(format!("{url} is not valid UTF-8: {err}")))
    }
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, GeseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("easygese/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GeseError::Network(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| GeseError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, GeseError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| GeseError::Network(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "request failed".to_string());
            return Err(GeseError::NetworkStatus {
                url: url.to_string(),
                status,
                message,
            });
        }
        let bytes = response
            .bytes()
            .map_err(|err| GeseError::Network(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}
