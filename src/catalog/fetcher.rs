use std::io::{self, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::catalog::cache::{is_stale, CatalogCache};
use crate::catalog::error::FetchError;
use crate::catalog::loader::{assemble, catalog_label, load, overlay_lines, split_lines};
use crate::catalog::CatalogSource;
use crate::config::CatalogConfig;
use crate::engine::{FrameSignal, TrackingEngine};
use crate::time::Clock;

/// Blocking fetch of a remote document.
pub trait Transport: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

/// Background worker keeping the engine's catalog in sync with the
/// configured source.
pub struct CatalogFetcher {
    engine: Arc<TrackingEngine>,
    cache: CatalogCache,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    config: CatalogConfig,
    observed: Option<CatalogSource>,
    next_check: Option<DateTime<Utc>>,
    overlay: Vec<u8>,
}

impl CatalogFetcher {
    pub fn new(
        engine: Arc<TrackingEngine>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: CatalogConfig,
    ) -> Self {
        let cache = CatalogCache::new(config.cache_dir.clone());
        debug!("Catalog cache in {}", cache.dir().display());
        Self {
            engine,
            cache,
            transport,
            clock,
            config,
            observed: None,
            next_check: None,
            overlay: Vec::new(),
        }
    }

    pub fn spawn(self, signal: Arc<FrameSignal>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("satellite-read".into())
            .spawn(move || self.run(&signal))
    }

    fn run(mut self, signal: &FrameSignal) {
        loop {
            signal.wait();
            let pause = self.poll();
            thread::sleep(pause);
        }
    }

    /// Check the source once, loading or refreshing the catalog if needed.
    /// Returns how long to sleep before waiting for the next frame.
    pub fn poll(&mut self) -> Duration {
        let source = self.engine.catalog_source();
        let now = self.clock.now();

        if self.observed.as_ref() != Some(&source) {
            debug!("Catalog source changed to {:?}", source.url);
            self.observed = Some(source.clone());
            self.next_check = None;
            if let Some(url) = self.open(&source, now) {
                self.refresh(&source, &url);
            }
        } else if self.next_check.is_some_and(|at| now >= at) {
            self.next_check = None;
            if let Some(url) = source.resolved_url() {
                info!("Cached {} is due for a refresh", source.cache_filename());
                self.refresh(&source, &url);
            }
        }

        self.config.poll_interval
    }

    /// Load whatever is cached for a new source. Returns the URL to fetch
    /// when the cached copy is missing or stale.
    fn open(&mut self, source: &CatalogSource, now: DateTime<Utc>) -> Option<String> {
        if source.is_disabled() {
            info!("Catalog disabled");
            self.engine.replace_catalog(Vec::new(), "");
            return None;
        }
        let Some(url) = source.resolved_url() else {
            info!("No identity available for {}, catalog disabled", source.url);
            self.engine.replace_catalog(Vec::new(), "");
            return None;
        };

        let filename = source.cache_filename();
        let Some(modified) = self.cache.modified(&filename) else {
            return Some(url);
        };

        let age = now - modified;
        info!("Cached {} is {} seconds old", filename, age.num_seconds());
        let staleness = to_chrono(self.config.staleness);
        let refetch = source.requires_identity() || is_stale(age, staleness);

        // A refetch brings the overlay along; otherwise fetch it once here.
        if !refetch && filename == self.config.canonical_file && self.overlay.is_empty() {
            self.refresh_overlay();
        }
        self.load_from_cache(&filename);

        if refetch {
            Some(url)
        } else {
            self.next_check = modified.checked_add_signed(staleness);
            None
        }
    }

    fn refresh(&mut self, source: &CatalogSource, url: &str) {
        let filename = source.cache_filename();
        if filename == self.config.canonical_file {
            self.refresh_overlay();
        }

        info!("Fetching {}", url);
        let bytes = match self.transport.fetch(url) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                let retry = to_chrono(self.config.retry_delay);
                self.next_check = self.clock.now().checked_add_signed(retry);
                return;
            }
        };
        info!("Fetched {} bytes for {}", bytes.len(), filename);

        let written = match self.cache.write(&filename, &bytes) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write cached {}: {}", filename, e);
                false
            }
        };

        thread::sleep(self.config.settle_delay);
        if written {
            self.load_from_cache(&filename);
        } else {
            self.install(split_lines(&String::from_utf8_lossy(&bytes)), &filename);
        }
        let staleness = to_chrono(self.config.staleness);
        self.next_check = self.clock.now().checked_add_signed(staleness);
    }

    fn refresh_overlay(&mut self) {
        if self.config.overlay_url.trim().is_empty() {
            return;
        }
        match self.transport.fetch(&self.config.overlay_url) {
            Ok(bytes) => self.overlay = bytes,
            Err(e) => warn!("Failed to fetch overlay {}: {}", self.config.overlay_url, e),
        }
    }

    fn load_from_cache(&self, filename: &str) {
        match self.cache.read_lines(filename) {
            Ok(Some(lines)) => self.install(lines, filename),
            Ok(None) => warn!("Cached {} disappeared", filename),
            Err(e) => warn!("Failed to read cached {}: {}", filename, e),
        }
    }

    fn install(&self, lines: Vec<String>, filename: &str) {
        let overlay = (filename == self.config.canonical_file && !self.overlay.is_empty())
            .then(|| overlay_lines(&self.overlay));
        let entries = load(&assemble(lines, overlay));
        let label = catalog_label(filename);
        info!("Loaded {} {} satellites", entries.len(), label);
        self.engine.replace_catalog(entries, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::cache::testing::scratch_dir;
    use crate::catalog::entry::fixtures::{text, ISS_2008, ISS_2020};
    use crate::engine::ViewerPosition;
    use crate::time::testing::FixedClock;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const VISUAL: &str = "http://host/visual.txt";
    const AMATEUR: &str = "http://host/amateur.txt";
    const OVERLAY: &str = "http://host/special.txt";

    #[derive(Default)]
    struct FakeTransport {
        documents: Mutex<HashMap<String, String>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        fn serve(&self, url: &str, body: String) {
            self.documents.lock().unwrap().insert(url.to_string(), body);
        }

        fn take_down(&self, url: &str) {
            self.documents.lock().unwrap().remove(url);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.documents
                .lock()
                .unwrap()
                .get(url)
                .map(|body| body.clone().into_bytes())
                .ok_or_else(|| FetchError::Http("404 Not Found".into()))
        }
    }

    struct Harness {
        engine: Arc<TrackingEngine>,
        transport: Arc<FakeTransport>,
        clock: Arc<FixedClock>,
        cache: CatalogCache,
        fetcher: CatalogFetcher,
    }

    fn harness(tag: &str, url: &str, overlay_url: &str) -> Harness {
        let dir = scratch_dir(tag);
        let config = CatalogConfig {
            url: url.to_string(),
            overlay_url: overlay_url.to_string(),
            cache_dir: dir.clone(),
            settle_delay: Duration::ZERO,
            ..CatalogConfig::default()
        };
        let engine = Arc::new(TrackingEngine::new(
            ViewerPosition::default(),
            CatalogSource::new(url, None),
            true,
        ));
        let transport = Arc::new(FakeTransport::default());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let fetcher = CatalogFetcher::new(engine.clone(), transport.clone(), clock.clone(), config);
        Harness {
            engine,
            transport,
            clock,
            cache: CatalogCache::new(dir),
            fetcher,
        }
    }

    #[test]
    fn fetches_and_caches_when_nothing_is_cached() {
        let mut h = harness("fetch-empty", VISUAL, "");
        h.transport.serve(VISUAL, text(&[ISS_2008, ISS_2020]));

        assert_eq!(h.fetcher.poll(), Duration::from_millis(100));
        assert_eq!(h.transport.calls(), vec![VISUAL]);
        assert_eq!(h.engine.catalog_len(), 2);
        assert_eq!(h.engine.catalog_label(), "brightest");
        assert_eq!(h.cache.read_lines("visual.txt").unwrap().map(|l| l.len()), Some(6));

        h.fetcher.poll();
        assert_eq!(h.transport.calls().len(), 1);
    }

    #[test]
    fn fresh_cache_is_used_without_fetching() {
        let mut h = harness("fetch-fresh", VISUAL, "");
        h.cache.write("visual.txt", text(&[ISS_2020]).as_bytes()).unwrap();

        h.fetcher.poll();
        assert!(h.transport.calls().is_empty());
        assert_eq!(h.engine.catalog_len(), 1);
    }

    #[test]
    fn stale_cache_is_loaded_then_refreshed() {
        let mut h = harness("fetch-stale", VISUAL, "");
        h.cache.write("visual.txt", text(&[ISS_2020]).as_bytes()).unwrap();
        h.clock.advance(chrono::Duration::hours(2));
        h.transport.serve(VISUAL, text(&[ISS_2008, ISS_2020]));

        h.fetcher.poll();
        assert_eq!(h.transport.calls(), vec![VISUAL]);
        assert_eq!(h.engine.catalog_len(), 2);
    }

    #[test]
    fn failed_fetch_keeps_cached_catalog_and_retries() {
        let mut h = harness("fetch-fail", VISUAL, "");
        h.cache.write("visual.txt", text(&[ISS_2020]).as_bytes()).unwrap();
        h.clock.advance(chrono::Duration::hours(2));

        h.fetcher.poll();
        assert_eq!(h.transport.calls().len(), 1);
        assert_eq!(h.engine.catalog_len(), 1);

        h.transport.serve(VISUAL, text(&[ISS_2008, ISS_2020]));
        h.clock.advance(chrono::Duration::seconds(10));
        h.fetcher.poll();
        assert_eq!(h.transport.calls().len(), 1);

        h.clock.advance(chrono::Duration::seconds(30));
        h.fetcher.poll();
        assert_eq!(h.transport.calls().len(), 2);
        assert_eq!(h.engine.catalog_len(), 2);
    }

    #[test]
    fn long_running_process_refreshes_after_staleness() {
        let mut h = harness("fetch-recheck", VISUAL, "");
        h.cache.write("visual.txt", text(&[ISS_2020]).as_bytes()).unwrap();
        h.fetcher.poll();
        assert!(h.transport.calls().is_empty());

        h.transport.serve(VISUAL, text(&[ISS_2008, ISS_2020]));
        h.clock.advance(chrono::Duration::minutes(30));
        h.fetcher.poll();
        assert!(h.transport.calls().is_empty());

        h.clock.advance(chrono::Duration::minutes(31));
        h.fetcher.poll();
        assert_eq!(h.transport.calls(), vec![VISUAL]);
        assert_eq!(h.engine.catalog_len(), 2);
    }

    #[test]
    fn missing_identity_disables_catalog() {
        let mut h = harness("fetch-identity", VISUAL, "");
        h.transport.serve(VISUAL, text(&[ISS_2020]));
        h.fetcher.poll();
        assert_eq!(h.engine.catalog_len(), 1);

        let favorites = "http://host/favorites.php?id={identity}";
        h.engine.set_catalog_source(CatalogSource::new(favorites, None));
        h.fetcher.poll();
        assert_eq!(h.engine.catalog_len(), 0);
        assert_eq!(h.transport.calls().len(), 1);

        h.transport.serve("http://host/favorites.php?id=7", text(&[ISS_2008]));
        h.engine.set_catalog_source(CatalogSource::new(favorites, Some("7".into())));
        h.fetcher.poll();
        assert_eq!(h.engine.catalog_len(), 1);
        assert_eq!(h.transport.calls().last().map(String::as_str), Some("http://host/favorites.php?id=7"));
    }

    #[test]
    fn empty_url_disables_catalog() {
        let mut h = harness("fetch-disabled", VISUAL, "");
        h.transport.serve(VISUAL, text(&[ISS_2020]));
        h.fetcher.poll();

        h.engine.set_catalog_source(CatalogSource::new("", None));
        h.fetcher.poll();
        assert_eq!(h.engine.catalog_len(), 0);
        assert_eq!(h.transport.calls().len(), 1);
        assert!(h.engine.satellites_loaded());
    }

    #[test]
    fn overlay_is_merged_into_canonical_catalog_only() {
        let mut h = harness("fetch-overlay", VISUAL, OVERLAY);
        h.transport.serve(OVERLAY, text(&[ISS_2008]));
        h.transport.serve(VISUAL, text(&[ISS_2020]));
        h.transport.serve(AMATEUR, text(&[ISS_2020]));

        h.fetcher.poll();
        assert_eq!(h.transport.calls(), vec![OVERLAY, VISUAL]);
        assert_eq!(h.engine.catalog_len(), 2);
        assert!(h.engine.lock().catalog[1].special);

        h.engine.set_catalog_source(CatalogSource::new(AMATEUR, None));
        h.fetcher.poll();
        assert_eq!(h.transport.calls().last().map(String::as_str), Some(AMATEUR));
        assert_eq!(h.engine.catalog_len(), 1);
        assert_eq!(h.engine.catalog_label(), "amateur radio");
    }

    #[test]
    fn overlay_failure_does_not_block_catalog() {
        let mut h = harness("fetch-overlay-down", VISUAL, OVERLAY);
        h.transport.serve(VISUAL, text(&[ISS_2020]));
        h.transport.take_down(OVERLAY);

        h.fetcher.poll();
        assert_eq!(h.engine.catalog_len(), 1);
    }
}
