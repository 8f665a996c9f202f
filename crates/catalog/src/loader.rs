use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use brandex_core::config::{CatalogConfig, CatalogSourceKind};
use brandex_core::domain::catalog::{Catalog, CatalogEntry};
use roxmltree::{Document, ParsingOptions};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::IngestError;
use crate::fixed_column;
use crate::normalizer::{normalize_feed, raw_excerpt, DEFAULT_EXCERPT_CHARS};
use crate::schema::{default_candidates, resolve, CatalogField, RawRecord, SchemaCandidate, DEFAULT_MIN_FIELDS};
use crate::transport::{FeedTransport, HttpFeedTransport};

const CURRENCY_SYMBOLS: [char; 3] = ['€', '$', '£'];
const CURRENCY_CODES: [&str; 2] = ["EUR", "USD"];
/// Unit prices above this are feed garbage and are coerced like any unparsable value.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Where the catalog comes from. Exactly one source is active per run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CatalogSource {
    FixedColumn { path: PathBuf },
    RemoteFeed { url: String },
}

impl CatalogSource {
    pub fn from_config(config: &CatalogConfig) -> Self {
        match config.source {
            CatalogSourceKind::File => Self::FixedColumn { path: config.file_path.clone() },
            CatalogSourceKind::Feed => {
                Self::RemoteFeed { url: config.feed.url.clone().unwrap_or_default() }
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::FixedColumn { path } => path.display().to_string(),
            Self::RemoteFeed { url } => url.clone(),
        }
    }
}

/// Per-load counters. Coercion failures never fail a load; they show up here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub source: String,
    pub schema_candidate: Option<String>,
    pub records_seen: usize,
    pub accepted: usize,
    pub dropped_without_identity: usize,
    pub prices_defaulted: usize,
}

impl LoadReport {
    fn for_source(source: &CatalogSource) -> Self {
        Self { source: source.label(), ..Self::default() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub report: LoadReport,
}

/// Outcome of a load that never fails: an empty catalog plus a diagnostic on error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub report: LoadReport,
    pub diagnostic: Option<IngestError>,
}

impl CatalogLoad {
    pub fn is_degraded(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Trims text and blanks the `nan` marker spreadsheets leave in empty cells.
pub fn normalize_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        trimmed.to_owned()
    }
}

/// Parses a display price such as `"1 234,50 €"`. `None` for blanks, garbage, negative
/// values and values above [`MAX_UNIT_PRICE`].
pub fn normalize_price(raw: &str) -> Option<Decimal> {
    let text = normalize_text(raw);
    let compact: String = text
        .chars()
        .filter(|ch| !ch.is_whitespace() && !CURRENCY_SYMBOLS.contains(ch))
        .collect();
    let compact = strip_currency_code(&compact);
    if compact.is_empty() {
        return None;
    }

    // With both separators present the later one is the decimal separator.
    let numeric = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(point)) if comma > point => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        (None, _) => compact.to_owned(),
    };

    let value = Decimal::from_str(&numeric).ok()?;
    (!value.is_sign_negative() && value <= MAX_UNIT_PRICE).then_some(value)
}

fn strip_currency_code(text: &str) -> &str {
    for code in CURRENCY_CODES {
        let Some(cut) = text.len().checked_sub(code.len()) else {
            continue;
        };
        if text.is_char_boundary(cut) && text[cut..].eq_ignore_ascii_case(code) {
            return &text[..cut];
        }
    }
    text
}

fn entry_from_record(record: &RawRecord, report: &mut LoadReport) -> Option<CatalogEntry> {
    let text = |field: CatalogField| record.get(field).map(normalize_text).unwrap_or_default();

    let code = text(CatalogField::Code);
    let product_name = text(CatalogField::Name);
    if code.is_empty() || product_name.is_empty() {
        report.dropped_without_identity += 1;
        debug!(
            event_name = "catalog.record.dropped",
            code = %code,
            product_name = %product_name,
            "record without code or product name dropped"
        );
        return None;
    }

    let unit_price = match record.get(CatalogField::Price).and_then(normalize_price) {
        Some(price) => price,
        None => {
            report.prices_defaulted += 1;
            Decimal::ZERO
        }
    };

    Some(CatalogEntry {
        code,
        product_name,
        color: text(CatalogField::Color),
        size: text(CatalogField::Size),
        unit_price,
        image_ref: text(CatalogField::Image),
    })
}

fn build_catalog(records: &[RawRecord], mut report: LoadReport) -> LoadedCatalog {
    report.records_seen = records.len();
    let entries: Vec<CatalogEntry> =
        records.iter().filter_map(|record| entry_from_record(record, &mut report)).collect();
    report.accepted = entries.len();
    LoadedCatalog { catalog: Catalog::new(entries), report }
}

pub struct CatalogLoader<T = HttpFeedTransport> {
    transport: T,
    feed_timeout: Duration,
    candidates: Vec<SchemaCandidate>,
    min_fields: usize,
}

impl CatalogLoader<HttpFeedTransport> {
    pub fn from_config(config: &CatalogConfig) -> Result<Self, IngestError> {
        let transport = HttpFeedTransport::from_config(&config.feed).map_err(|error| {
            IngestError::SourceUnavailable {
                source_label: CatalogSource::from_config(config).label(),
                reason: error.to_string(),
            }
        })?;
        Ok(Self::new(transport, Duration::from_secs(config.feed.timeout_secs)))
    }
}

impl<T: FeedTransport> CatalogLoader<T> {
    pub fn new(transport: T, feed_timeout: Duration) -> Self {
        Self {
            transport,
            feed_timeout,
            candidates: default_candidates(),
            min_fields: DEFAULT_MIN_FIELDS,
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<SchemaCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_min_fields(mut self, min_fields: usize) -> Self {
        self.min_fields = min_fields;
        self
    }

    pub fn load(&self, source: &CatalogSource) -> Result<LoadedCatalog, IngestError> {
        let loaded = match source {
            CatalogSource::FixedColumn { path } => {
                let records = fixed_column::read_records(path)?;
                build_catalog(&records, LoadReport::for_source(source))
            }
            CatalogSource::RemoteFeed { url } => {
                let raw = self.transport.fetch(url, self.feed_timeout).map_err(|error| {
                    IngestError::SourceUnavailable {
                        source_label: url.clone(),
                        reason: error.to_string(),
                    }
                })?;
                self.parse_feed(&raw, source)?
            }
        };

        info!(
            event_name = "catalog.load.completed",
            source = %loaded.report.source,
            schema_candidate = loaded.report.schema_candidate.as_deref().unwrap_or("fixed-column"),
            records_seen = loaded.report.records_seen,
            accepted = loaded.report.accepted,
            dropped_without_identity = loaded.report.dropped_without_identity,
            prices_defaulted = loaded.report.prices_defaulted,
            "catalog loaded"
        );
        Ok(loaded)
    }

    pub fn load_or_empty(&self, source: &CatalogSource) -> CatalogLoad {
        match self.load(source) {
            Ok(LoadedCatalog { catalog, report }) => CatalogLoad { catalog, report, diagnostic: None },
            Err(error) => {
                warn!(
                    event_name = "catalog.load.degraded",
                    source = %source.label(),
                    error_kind = error.kind(),
                    error = %error,
                    "catalog unavailable, continuing with an empty catalog"
                );
                if let Some(payload) = error.excerpt() {
                    debug!(event_name = "catalog.load.excerpt", excerpt = %payload, "payload excerpt");
                }
                CatalogLoad {
                    catalog: Catalog::empty(),
                    report: LoadReport::for_source(source),
                    diagnostic: Some(error),
                }
            }
        }
    }

    /// Normalizes, parses and resolves an already fetched feed body.
    pub fn parse_feed(&self, raw: &[u8], source: &CatalogSource) -> Result<LoadedCatalog, IngestError> {
        let normalized = normalize_feed(raw);
        let options = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
        let document = Document::parse_with_options(&normalized.text, options).map_err(|error| {
            IngestError::MalformedDocument {
                reason: error.to_string(),
                excerpt: raw_excerpt(raw, DEFAULT_EXCERPT_CHARS),
            }
        })?;

        let resolved = resolve(&document, &self.candidates, self.min_fields).map_err(|error| {
            IngestError::SchemaUnresolved {
                reason: error.to_string(),
                excerpt: raw_excerpt(raw, DEFAULT_EXCERPT_CHARS),
            }
        })?;

        let mut report = LoadReport::for_source(source);
        report.schema_candidate = Some(resolved.candidate.clone());
        Ok(build_catalog(&resolved.records, report))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::str::FromStr;

    use brandex_core::config::{CatalogConfig, CatalogSourceKind, FeedConfig};
    use rust_decimal::Decimal;

    use super::{normalize_price, normalize_text, CatalogSource, MAX_UNIT_PRICE};

    fn price(text: &str) -> Decimal {
        Decimal::from_str(text).expect("valid decimal literal")
    }

    #[test]
    fn prices_accept_decimal_comma_currency_and_spaces() {
        assert_eq!(normalize_price("10,50"), Some(price("10.50")));
        assert_eq!(normalize_price(" 9.90 € "), Some(price("9.90")));
        assert_eq!(normalize_price("1 234,50 EUR"), Some(price("1234.50")));
        assert_eq!(normalize_price("1\u{a0}234,5"), Some(price("1234.5")));
        assert_eq!(normalize_price("1.234,50"), Some(price("1234.50")));
        assert_eq!(normalize_price("1,234.50"), Some(price("1234.50")));
        assert_eq!(normalize_price("12"), Some(price("12")));
    }

    #[test]
    fn unusable_prices_are_none() {
        assert_eq!(normalize_price(""), None);
        assert_eq!(normalize_price("nan"), None);
        assert_eq!(normalize_price("na dopyt"), None);
        assert_eq!(normalize_price("-3,00"), None);
        assert_eq!(normalize_price("€"), None);
    }

    #[test]
    fn implausibly_large_prices_are_rejected() {
        assert_eq!(normalize_price("99999999999999999999999999"), None);
        assert_eq!(normalize_price("1000000,01"), None);
        assert_eq!(normalize_price("1 000 000"), Some(MAX_UNIT_PRICE));
    }

    #[test]
    fn text_is_trimmed_and_nan_is_blank() {
        assert_eq!(normalize_text("  Polo  "), "Polo");
        assert_eq!(normalize_text("NaN"), "");
        assert_eq!(normalize_text("Nanuk"), "Nanuk");
    }

    #[test]
    fn source_follows_configured_kind() {
        let mut config = CatalogConfig {
            source: CatalogSourceKind::File,
            file_path: PathBuf::from("produkty.xlsx"),
            cache_ttl_secs: 600,
            feed: FeedConfig {
                url: Some("https://feeds.example.com/export.xml".to_string()),
                username: None,
                password: None,
                timeout_secs: 20,
            },
        };
        assert_eq!(
            CatalogSource::from_config(&config),
            CatalogSource::FixedColumn { path: PathBuf::from("produkty.xlsx") }
        );

        config.source = CatalogSourceKind::Feed;
        let source = CatalogSource::from_config(&config);
        assert_eq!(source.label(), "https://feeds.example.com/export.xml");
    }
}
