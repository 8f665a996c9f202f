pub mod config;
pub mod domain;
pub mod errors;
pub mod quote;
pub mod telemetry;

pub use domain::catalog::{sort_sizes, Catalog, CatalogEntry};
pub use domain::offer::{BrandingInfo, BrandingTechnology, CustomerInfo, Offer, OfferLine};
pub use errors::{ApplicationError, DomainError};
pub use quote::builder::{AddOutcome, OfferSelection};
pub use quote::document::QuoteDocument;
pub use quote::grouping::{group_lines, LineGroup};
pub use quote::pricing::{price_lines, PricingSummary};
pub use quote::QuoteSession;
