pub mod cache;
pub mod errors;
pub mod fixed_column;
pub mod loader;
pub mod normalizer;
pub mod schema;
pub mod transport;

pub use cache::{CatalogCache, CatalogSnapshot};
pub use errors::IngestError;
pub use loader::{
    normalize_price, normalize_text, CatalogLoad, CatalogLoader, CatalogSource, LoadReport,
    LoadedCatalog,
};
pub use normalizer::{normalize_feed, NormalizedFeed};
pub use schema::{
    default_candidates, resolve, CatalogField, FieldAliases, RecordSelector, SchemaCandidate,
};
pub use transport::{FeedTransport, HttpFeedTransport, TransportError};
