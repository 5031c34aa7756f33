//! Read functions: turn an absolute location into bytes
//!
//! The loader never touches the file system or the network directly; it
//! calls a [`ReadFromUri`] function. Tests and embedders swap in
//! [`read_from_memory`].
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use anyhow::{anyhow, Context};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Pluggable read function used for every external document
pub type ReadFromUri = Arc<dyn Fn(&Url) -> anyhow::Result<Vec<u8>> + Send + Sync>;

/// Read `file://` locations from the local file system
pub fn read_from_files() -> ReadFromUri {
    Arc::new(|location: &Url| read_file(location))
}

fn read_file(location: &Url) -> anyhow::Result<Vec<u8>> {
    if location.scheme() != "file" {
        return Err(anyhow!("unsupported scheme '{}'", location.scheme()));
    }
    let path = location
        .to_file_path()
        .map_err(|_| anyhow!("'{}' is not a local file path", location))?;
    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))
}

/// Serve locations from a map of absolute URL strings to contents.
/// Keys are compared after URL normalization, so `file:///a/./b.yaml`
/// and `file:///a/b.yaml` are the same entry.
pub fn read_from_memory<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> ReadFromUri
where
    K: AsRef<str>,
    V: Into<Vec<u8>>,
{
    let entries: HashMap<String, Vec<u8>> = entries
        .into_iter()
        .map(|(key, value)| {
            let key = Url::parse(key.as_ref())
                .map(|url| url.to_string())
                .unwrap_or_else(|_| key.as_ref().to_string());
            (key, value.into())
        })
        .collect();

    Arc::new(move |location: &Url| {
        let mut key = location.clone();
        key.set_fragment(None);
        entries
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("no in-memory document at '{}'", key))
    })
}

/// Configuration for the HTTP read function
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpReaderConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

#[cfg(feature = "http")]
impl Default for HttpReaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("oasis-schema/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(feature = "http")]
impl HttpReaderConfig {
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetch `http` and `https` locations with a blocking client.
/// Any non-2xx status is an error.
#[cfg(feature = "http")]
pub fn read_from_http(config: HttpReaderConfig) -> anyhow::Result<ReadFromUri> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent)
        .build()
        .context("building HTTP client")?;

    Ok(Arc::new(move |location: &Url| {
        if !matches!(location.scheme(), "http" | "https") {
            return Err(anyhow!("unsupported scheme '{}'", location.scheme()));
        }
        tracing::debug!(%location, "fetching over HTTP");
        let response = client
            .get(location.clone())
            .send()
            .with_context(|| format!("requesting {}", location))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("error loading '{}': request returned status code {}", location, status.as_u16()));
        }
        let body = response.bytes().with_context(|| format!("reading body of {}", location))?;
        Ok(body.to_vec())
    }))
}

/// Read files, and HTTP locations when the `http` feature is enabled
pub fn read_from_uris() -> ReadFromUri {
    #[cfg(feature = "http")]
    {
        let http = read_from_http(HttpReaderConfig::default()).ok();
        Arc::new(move |location: &Url| match (location.scheme(), &http) {
            ("http" | "https", Some(http)) => http(location),
            _ => read_file(location),
        })
    }
    #[cfg(not(feature = "http"))]
    {
        read_from_files()
    }
}
