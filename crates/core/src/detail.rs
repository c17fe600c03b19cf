//! Borough detail page: slug from the page URL, a cached loader over a
//! pluggable transport, and the view model the page renders.
//!
//! Cached responses live in a string key-value store (the browser's
//! `localStorage` on the web, [`MemoryStore`] elsewhere) under
//! `{prefix}_{slug}` as `{"data": .., "timestamp": ..}`.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::DetailConfig;
use crate::model::borough::{BoroughDetail, image_url};

pub const DEFAULT_LOAD_FAILURE: &str = "Failed to load borough data";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailError {
    #[error("Borough not found")]
    NotFound,
    #[error("{0}")]
    LoadFailure(String),
    #[error("No borough specified in URL")]
    MissingParameter,
}

impl DetailError {
    pub fn load_failure() -> Self {
        Self::LoadFailure(DEFAULT_LOAD_FAILURE.to_string())
    }

    /// Error for a non-OK HTTP status; `None` for 2xx.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            404 => Some(Self::NotFound),
            _ => Some(Self::load_failure()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("storage unavailable: {0}")]
pub struct StoreError(pub String);

/// String key-value storage for cached responses.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Transport for `GET {api_base}/boroughs/{slug}`.
///
/// Implementations map a 404 to [`DetailError::NotFound`] and any other
/// failure (status, network, body) to [`DetailError::LoadFailure`].
pub trait BoroughSource {
    fn fetch(&self, url: &Url) -> Result<BoroughDetail, DetailError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: BoroughDetail,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl CacheEntry {
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Reads the `borough` query parameter. Absent, empty or unparsable URLs
/// all count as a missing parameter.
pub fn slug_from_url(page_url: &str) -> Result<String, DetailError> {
    let url = Url::parse(page_url).map_err(|e| {
        debug!("unparsable page url {page_url:?}: {e}");
        DetailError::MissingParameter
    })?;
    url.query_pairs()
        .find(|(k, _)| k == "borough")
        .map(|(_, v)| v.into_owned())
        .filter(|slug| !slug.is_empty())
        .ok_or(DetailError::MissingParameter)
}

/// `{api_base}/boroughs/{slug}` with the slug percent-encoded as one segment.
pub fn endpoint(api_base: &str, slug: &str) -> Result<Url, DetailError> {
    let mut url = Url::parse(api_base)
        .map_err(|e| DetailError::LoadFailure(format!("invalid API base {api_base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| DetailError::LoadFailure(format!("API base {api_base:?} cannot take a path")))?
        .pop_if_empty()
        .push("boroughs")
        .push(slug);
    Ok(url)
}

pub struct DetailLoader<S, B> {
    config: DetailConfig,
    store: S,
    source: B,
}

impl<S: KeyValueStore, B: BoroughSource> DetailLoader<S, B> {
    pub fn new(config: DetailConfig, store: S, source: B) -> Self {
        Self { config, store, source }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn source(&self) -> &B {
        &self.source
    }

    pub fn cache_key(&self, slug: &str) -> String {
        format!("{}_{slug}", self.config.cache_key_prefix)
    }

    /// The cached record for `slug` if it is younger than the TTL.
    /// Expired and unreadable entries are removed.
    pub fn get_cached(&mut self, slug: &str, now_ms: u64) -> Option<BoroughDetail> {
        let key = self.cache_key(slug);
        let raw = self.store.get(&key)?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("discarding unreadable cache entry {key}: {e}");
                self.store.remove(&key);
                return None;
            }
        };
        if entry.is_fresh(now_ms, self.config.cache_ttl_ms) {
            return Some(entry.data);
        }
        debug!("cache entry {key} expired");
        self.store.remove(&key);
        None
    }

    /// Store `data` stamped with `now_ms`. Storage failures are logged
    /// and otherwise ignored.
    pub fn set_cached(&mut self, slug: &str, data: &BoroughDetail, now_ms: u64) {
        let entry = CacheEntry {
            data: data.clone(),
            timestamp: now_ms,
        };
        let key = self.cache_key(slug);
        let result = serde_json::to_string(&entry)
            .map_err(|e| StoreError(e.to_string()))
            .and_then(|json| self.store.set(&key, json));
        if let Err(e) = result {
            warn!("failed to cache data for {slug}: {e}");
        }
    }

    /// Cache first, then the source. Successful fetches are cached.
    pub fn load(&mut self, slug: &str, now_ms: u64) -> Result<BoroughDetail, DetailError> {
        if let Some(cached) = self.get_cached(slug, now_ms) {
            info!("using cached data for {slug}");
            return Ok(cached);
        }
        let url = endpoint(&self.config.api_base, slug)?;
        let data = self.source.fetch(&url)?;
        self.set_cached(slug, &data, now_ms);
        Ok(data)
    }

    /// Everything the detail page does on load: read the slug, load, and
    /// build the view. A missing slug never reaches the source.
    pub fn open_page(&mut self, page_url: &str, now_ms: u64) -> DetailView {
        let result = slug_from_url(page_url).and_then(|slug| self.load(&slug, now_ms));
        if let Err(e) = &result {
            error!("error loading borough: {e}");
        }
        DetailView::from_result(result)
    }
}

/// Populated detail page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailPage {
    pub title: String,
    pub description: String,
    pub name: String,
    pub location: String,
    pub history: String,
    pub living: String,
    pub image_src: String,
    pub image_alt: String,
}

impl From<&BoroughDetail> for DetailPage {
    fn from(borough: &BoroughDetail) -> Self {
        Self {
            title: borough.name.clone(),
            description: format!(
                "Detailed guide to {}, including location, history and living information.",
                borough.name
            ),
            name: borough.name.clone(),
            location: borough.location.clone(),
            history: borough.history.clone(),
            living: borough.living.clone(),
            image_src: image_url(&borough.slug),
            image_alt: format!("{} view", borough.name),
        }
    }
}

/// Which of the page's three panels is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailView {
    Loading,
    Ready(DetailPage),
    Error { message: String },
}

impl DetailView {
    pub fn from_result(result: Result<BoroughDetail, DetailError>) -> Self {
        match result {
            Ok(borough) => Self::Ready(DetailPage::from(&borough)),
            Err(e) => Self::Error { message: e.to_string() },
        }
    }

    pub fn loading_visible(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn main_visible(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

#[cfg(feature = "http")]
pub use http::HttpSource;

#[cfg(feature = "http")]
mod http {
    use log::debug;
    use reqwest::blocking::Client;
    use url::Url;

    use super::{BoroughSource, DetailError};
    use crate::model::borough::BoroughDetail;

    /// Blocking HTTP transport.
    #[derive(Debug, Clone, Default)]
    pub struct HttpSource {
        client: Client,
    }

    impl HttpSource {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl BoroughSource for HttpSource {
        fn fetch(&self, url: &Url) -> Result<BoroughDetail, DetailError> {
            debug!("GET {url}");
            let response = self
                .client
                .get(url.clone())
                .send()
                .map_err(|e| DetailError::LoadFailure(e.to_string()))?;
            let status = response.status();
            if let Some(e) = DetailError::from_status(status.as_u16()) {
                debug!("{url} answered {status}");
                return Err(e);
            }
            response
                .json::<BoroughDetail>()
                .map_err(|e| DetailError::LoadFailure(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const MINUTE: u64 = 60 * 1000;

    fn camden() -> BoroughDetail {
        BoroughDetail {
            name: "Camden".into(),
            slug: "camden".into(),
            location: "North London".into(),
            history: "...".into(),
            living: "...".into(),
        }
    }

    /// Serves `camden`, 404s everything else, and counts requests.
    #[derive(Default)]
    struct FakeApi {
        requests: Cell<usize>,
    }

    impl BoroughSource for FakeApi {
        fn fetch(&self, url: &Url) -> Result<BoroughDetail, DetailError> {
            self.requests.set(self.requests.get() + 1);
            match url.path() {
                "/api/data/boroughs/camden" => Ok(camden()),
                _ => Err(DetailError::NotFound),
            }
        }
    }

    fn loader() -> DetailLoader<MemoryStore, FakeApi> {
        DetailLoader::new(DetailConfig::default(), MemoryStore::new(), FakeApi::default())
    }

    #[test]
    fn slug_from_query() {
        assert_eq!(
            slug_from_url("http://site/borough.html?borough=camden").unwrap(),
            "camden"
        );
        assert_eq!(
            slug_from_url("http://site/borough.html?x=1&borough=tower-hamlets").unwrap(),
            "tower-hamlets"
        );
        for url in ["http://site/borough.html", "http://site/b.html?borough=", "not a url"] {
            assert_eq!(slug_from_url(url), Err(DetailError::MissingParameter), "{url}");
        }
    }

    #[test]
    fn endpoint_appends_segments() {
        let url = endpoint("http://localhost:3000/api/data", "camden").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/data/boroughs/camden");
        let url = endpoint("http://localhost:3000/api/data/", "a b").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/data/boroughs/a%20b");
        assert!(matches!(endpoint("nope", "camden"), Err(DetailError::LoadFailure(_))));
    }

    #[test]
    fn cache_round_trip_then_expiry() {
        let mut loader = loader();
        let start = 1_700_000_000_000;
        loader.set_cached("camden", &camden(), start);
        assert!(loader.store().contains("borough_data_cache_camden"));

        assert_eq!(loader.get_cached("camden", start + 4 * MINUTE), Some(camden()));
        assert_eq!(loader.get_cached("camden", start + 5 * MINUTE), None);
        assert!(!loader.store().contains("borough_data_cache_camden"));
    }

    #[test]
    fn corrupt_entry_is_a_miss_and_removed() {
        let mut loader = loader();
        loader
            .store
            .set("borough_data_cache_camden", "{not json".into())
            .unwrap();
        assert_eq!(loader.get_cached("camden", 0), None);
        assert!(loader.store().is_empty());

        // A later load goes to the source and repopulates the cache.
        assert_eq!(loader.load("camden", 0), Ok(camden()));
        assert_eq!(loader.source().requests.get(), 1);
        assert!(loader.store().contains("borough_data_cache_camden"));
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let mut loader = loader();
        loader.load("camden", 0).unwrap();
        loader.load("camden", MINUTE).unwrap();
        assert_eq!(loader.source().requests.get(), 1);

        loader.load("camden", 10 * MINUTE).unwrap();
        assert_eq!(loader.source().requests.get(), 2);
    }

    #[test]
    fn camden_page() {
        let mut loader = loader();
        let view = loader.open_page("http://site/borough.html?borough=camden", 0);
        assert!(!view.loading_visible());
        assert!(view.main_visible());
        let DetailView::Ready(page) = view else {
            panic!("expected the main panel");
        };
        assert_eq!(page.title, "Camden");
        assert_eq!(page.location, "North London");
        assert_eq!(page.image_src, "https://picsum.photos/id/1064/600/400");
        assert_eq!(page.image_alt, "Camden view");
    }

    #[test]
    fn unknown_borough_shows_not_found() {
        let mut loader = loader();
        let view = loader.open_page("http://site/borough.html?borough=unknown-borough", 0);
        assert!(!view.loading_visible());
        assert!(!view.main_visible());
        assert_eq!(view.error_message(), Some("Borough not found"));
        assert!(loader.store().is_empty());
    }

    #[test]
    fn missing_slug_never_fetches() {
        let mut loader = loader();
        let view = loader.open_page("http://site/borough.html", 0);
        assert_eq!(view.error_message(), Some("No borough specified in URL"));
        assert_eq!(loader.source().requests.get(), 0);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(DetailError::from_status(200), None);
        assert_eq!(DetailError::from_status(404), Some(DetailError::NotFound));
        assert_eq!(DetailError::from_status(503), Some(DetailError::load_failure()));
    }

    #[test]
    fn load_failure_message() {
        assert_eq!(DetailError::load_failure().to_string(), "Failed to load borough data");
        let view = DetailView::from_result(Err(DetailError::LoadFailure("timed out".into())));
        assert_eq!(view.error_message(), Some("timed out"));
    }
}
