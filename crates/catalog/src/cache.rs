use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use brandex_core::config::CatalogConfig;
use brandex_core::domain::catalog::Catalog;
use tracing::debug;

use crate::errors::IngestError;
use crate::loader::{CatalogLoad, CatalogLoader, CatalogSource, LoadReport};
use crate::transport::{FeedTransport, HttpFeedTransport};

#[derive(Clone, Debug)]
enum Freshness {
    Fetched(Instant),
    Modified(SystemTime),
}

#[derive(Clone, Debug)]
struct CachedCatalog {
    catalog: Arc<Catalog>,
    report: LoadReport,
    freshness: Freshness,
}

/// What a caller sees for the active catalog at one point in time.
#[derive(Clone, Debug)]
pub struct CatalogSnapshot {
    pub catalog: Arc<Catalog>,
    pub report: LoadReport,
    pub diagnostic: Option<IngestError>,
    pub from_cache: bool,
}

/// Memoizes the active source. Feeds expire after the TTL, files when their
/// modification time changes. Failed loads are never stored.
pub struct CatalogCache<T = HttpFeedTransport> {
    loader: CatalogLoader<T>,
    source: CatalogSource,
    ttl: Duration,
    slot: Option<CachedCatalog>,
}

impl CatalogCache<HttpFeedTransport> {
    pub fn from_config(config: &CatalogConfig) -> Result<Self, IngestError> {
        Ok(Self::new(
            CatalogLoader::from_config(config)?,
            CatalogSource::from_config(config),
            Duration::from_secs(config.cache_ttl_secs),
        ))
    }
}

impl<T: FeedTransport> CatalogCache<T> {
    pub fn new(loader: CatalogLoader<T>, source: CatalogSource, ttl: Duration) -> Self {
        Self { loader, source, ttl, slot: None }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn get(&mut self) -> CatalogSnapshot {
        self.get_at(Instant::now())
    }

    pub fn get_at(&mut self, now: Instant) -> CatalogSnapshot {
        if let Some(cached) = &self.slot {
            if self.is_fresh(&cached.freshness, now) {
                debug!(
                    event_name = "catalog.cache.hit",
                    source = %self.source.label(),
                    entries = cached.catalog.len(),
                    "serving cached catalog"
                );
                return CatalogSnapshot {
                    catalog: Arc::clone(&cached.catalog),
                    report: cached.report.clone(),
                    diagnostic: None,
                    from_cache: true,
                };
            }
        }

        // Captured before loading so an edit during the load forces a reload next time.
        let modified = match &self.source {
            CatalogSource::FixedColumn { path } => file_modified(path),
            CatalogSource::RemoteFeed { .. } => None,
        };

        let CatalogLoad { catalog, report, diagnostic } = self.loader.load_or_empty(&self.source);
        let catalog = Arc::new(catalog);

        self.slot = match (&diagnostic, &self.source) {
            (Some(_), _) => None,
            (None, CatalogSource::RemoteFeed { .. }) => Some(CachedCatalog {
                catalog: Arc::clone(&catalog),
                report: report.clone(),
                freshness: Freshness::Fetched(now),
            }),
            (None, CatalogSource::FixedColumn { .. }) => modified.map(|modified| CachedCatalog {
                catalog: Arc::clone(&catalog),
                report: report.clone(),
                freshness: Freshness::Modified(modified),
            }),
        };

        CatalogSnapshot { catalog, report, diagnostic, from_cache: false }
    }

    pub fn invalidate(&mut self) {
        if self.slot.take().is_some() {
            debug!(event_name = "catalog.cache.invalidated", source = %self.source.label(), "cache cleared");
        }
    }

    fn is_fresh(&self, freshness: &Freshness, now: Instant) -> bool {
        match (freshness, &self.source) {
            (Freshness::Fetched(at), _) => now.saturating_duration_since(*at) < self.ttl,
            (Freshness::Modified(seen), CatalogSource::FixedColumn { path }) => {
                file_modified(path).is_some_and(|current| current == *seen)
            }
            (Freshness::Modified(_), CatalogSource::RemoteFeed { .. }) => false,
        }
    }
}

fn file_modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|metadata| metadata.modified()).ok()
}
