use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{
    ETAG, HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CACHE_VERSION: u32 = 2;
const CACHE_DIR: &str = "liga_elo";
const HTTP_DIR: &str = "http";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    url: String,
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: i64,
}

/// Response bodies stored one JSON file per URL under `root`.
///
/// `https://api.openligadb.de/getmatchdata/bl1/2004` lands in
/// `<root>/api.openligadb.de/getmatchdata/bl1/2004.json`, so a run only
/// rewrites the entries it actually refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCache {
    root: PathBuf,
}

impl HttpCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache under the per-user cache directory, if one can be located.
    pub fn in_app_dir() -> Option<Self> {
        app_cache_dir().map(|dir| Self::new(dir.join(HTTP_DIR)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the entry for `url`; `None` for URLs without a host.
    pub fn entry_path(&self, url: &str) -> Option<PathBuf> {
        let url = Url::parse(url).ok()?;
        let host = match url.port() {
            Some(port) => format!("{}_{port}", url.host_str()?),
            None => url.host_str()?.to_string(),
        };
        let mut path = self.root.join(sanitize(&host));
        let segments = url
            .path_segments()
            .map(|s| s.filter(|s| !s.is_empty()).map(sanitize).collect::<Vec<_>>())
            .unwrap_or_default();
        match segments.split_last() {
            Some((file, dirs)) => {
                for dir in dirs {
                    path.push(dir);
                }
                path.push(format!("{file}.json"));
            }
            None => path.push("index.json"),
        }
        Some(path)
    }

    /// GET through the cache.
    ///
    /// An entry fetched at or after `settled_at` (unix seconds) is served
    /// without touching the network. Otherwise the request is revalidated
    /// with the stored ETag / Last-Modified; a 304 serves the stored body and
    /// any other success replaces it.
    pub fn fetch(&self, client: &Client, url: &str, settled_at: Option<i64>) -> Result<String> {
        let cached = self.load(url);
        if let (Some(entry), Some(settled_at)) = (cached.as_ref(), settled_at) {
            if entry.fetched_at >= settled_at {
                debug!(url, "settled, serving cached body");
                return Ok(entry.body.clone());
            }
        }

        let mut req = client.get(url);
        if let Some(entry) = cached.as_ref() {
            if let Some(etag) = entry.etag.as_ref() {
                req = req.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = entry.last_modified.as_ref() {
                req = req.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let resp = req
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        let status = resp.status();
        let etag = header_value(resp.headers(), ETAG);
        let last_modified = header_value(resp.headers(), LAST_MODIFIED);

        if status == StatusCode::NOT_MODIFIED {
            let Some(mut entry) = cached else {
                return Err(anyhow::anyhow!("received 304 without cache body"));
            };
            debug!(url, "not modified, serving cached body");
            entry.fetched_at = Utc::now().timestamp();
            self.store_or_warn(&entry);
            return Ok(entry.body);
        }

        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, body));
        }

        self.store_or_warn(&CacheEntry {
            version: CACHE_VERSION,
            url: url.to_string(),
            body: body.clone(),
            etag,
            last_modified,
            fetched_at: Utc::now().timestamp(),
        });
        Ok(body)
    }

    fn load(&self, url: &str) -> Option<CacheEntry> {
        let raw = fs::read_to_string(self.entry_path(url)?).ok()?;
        let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
        (entry.version == CACHE_VERSION && entry.url == url).then_some(entry)
    }

    fn store(&self, entry: &CacheEntry) -> Result<()> {
        let Some(path) = self.entry_path(&entry.url) else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create cache dir {}", dir.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(entry).context("serialize cache entry")?;
        fs::write(&tmp, json).context("write cache entry")?;
        fs::rename(&tmp, &path).context("swap cache entry")?;
        Ok(())
    }

    fn store_or_warn(&self, entry: &CacheEntry) {
        if let Err(err) = self.store(entry) {
            warn!(url = %entry.url, "http cache not saved: {err:#}");
        }
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn sanitize(segment: &str) -> String {
    let cleaned = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}
