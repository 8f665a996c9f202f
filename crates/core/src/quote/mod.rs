pub mod builder;
pub mod document;
pub mod grouping;
pub mod pricing;

use chrono::NaiveDate;
use tracing::info;

use crate::config::OfferConfig;
use crate::domain::catalog::Catalog;
use crate::domain::offer::{BrandingInfo, CustomerInfo, Offer, OfferLine};
use crate::errors::DomainError;

use self::{
    builder::{AddOutcome, OfferSelection},
    document::QuoteDocument,
    pricing::{DeterministicPricingEngine, PricingEngine, PricingSummary},
};

/// The editing context of one operator: the offer being built and the engine that prices
/// it. Callers own the session and pass the catalog in explicitly on every add.
pub struct QuoteSession<P = DeterministicPricingEngine> {
    offer: Offer,
    pricing_engine: P,
}

impl QuoteSession<DeterministicPricingEngine> {
    pub fn new(today: NaiveDate, config: &OfferConfig) -> Self {
        Self::with_engine(today, config, DeterministicPricingEngine)
    }
}

impl<P> QuoteSession<P>
where
    P: PricingEngine,
{
    pub fn with_engine(today: NaiveDate, config: &OfferConfig, pricing_engine: P) -> Self {
        Self { offer: Offer::blank(today, config.validity_days), pricing_engine }
    }

    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    pub fn lines(&self) -> &[OfferLine] {
        self.offer.lines()
    }

    pub fn customer_mut(&mut self) -> &mut CustomerInfo {
        &mut self.offer.customer
    }

    pub fn branding_mut(&mut self) -> &mut BrandingInfo {
        &mut self.offer.branding
    }

    pub fn add_selection(
        &mut self,
        catalog: &Catalog,
        selection: &OfferSelection,
    ) -> Result<AddOutcome, DomainError> {
        builder::add_selection(&mut self.offer, catalog, selection)
    }

    pub fn remove(&mut self, index: usize) -> Option<OfferLine> {
        let removed = self.offer.remove(index);
        if let Some(line) = &removed {
            info!(
                event_name = "offer.line.removed",
                code = %line.code,
                size = %line.size,
                "offer line removed"
            );
        }
        removed
    }

    pub fn remove_line(&mut self, code: &str, size: &str) -> Option<OfferLine> {
        let index = self.offer.lines().iter().position(|line| line.is_same_variant(code, size))?;
        self.remove(index)
    }

    pub fn clear(&mut self) {
        let cleared = self.offer.len();
        self.offer.clear();
        info!(event_name = "offer.cleared", cleared, "offer lines cleared");
    }

    pub fn summary(&self) -> PricingSummary {
        self.pricing_engine.price(self.offer.lines())
    }

    pub fn document(&self) -> QuoteDocument {
        QuoteDocument::compose(&self.offer, &self.pricing_engine)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::config::OfferConfig;
    use crate::domain::catalog::{Catalog, CatalogEntry};
    use crate::domain::offer::{BrandingTechnology, OfferLine};
    use crate::quote::builder::OfferSelection;
    use crate::quote::pricing::{PricingEngine, PricingSummary, PricingTrace};
    use crate::quote::QuoteSession;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
    }

    fn catalog() -> Catalog {
        let entry = |code: &str, color: &str, size: &str| CatalogEntry {
            code: code.to_owned(),
            product_name: "Polo".to_owned(),
            color: color.to_owned(),
            size: size.to_owned(),
            unit_price: Decimal::new(1000, 2),
            image_ref: format!("https://img.example.com/{code}.jpg"),
        };
        Catalog::new(vec![
            entry("B02E-R", "Red", "S"),
            entry("B02E-R", "Red", "M"),
            entry("B02E-B", "Blue", "M"),
        ])
    }

    fn selection(color: &str, sizes: &[&str]) -> OfferSelection {
        OfferSelection {
            product_name: "Polo".to_owned(),
            color: color.to_owned(),
            sizes: sizes.iter().map(|size| size.to_string()).collect(),
            quantity: 5,
            discount_percent: 10,
            branding_unit_price: Decimal::new(150, 2),
            custom_image: None,
        }
    }

    #[test]
    fn session_builds_groups_and_totals_from_explicit_catalog() {
        let mut session = QuoteSession::new(today(), &OfferConfig { validity_days: 14 });
        session.add_selection(&catalog(), &selection("Red", &["S", "M"])).expect("add red");
        session.add_selection(&catalog(), &selection("Blue", &["M"])).expect("add blue");
        session.branding_mut().technology = BrandingTechnology::Embroidery;

        let document = session.document();
        assert_eq!(document.groups.len(), 2);
        assert_eq!(document.groups[0].row_span(), 2);
        assert_eq!(document.technology_label, "Výšivka");
        assert_eq!(session.summary().vat_base, Decimal::new(15750, 2));
    }

    #[test]
    fn removing_and_clearing_lines_reprices_from_scratch() {
        let mut session = QuoteSession::new(today(), &OfferConfig { validity_days: 14 });
        session.add_selection(&catalog(), &selection("Red", &["S", "M"])).expect("add red");

        let removed = session.remove_line("B02E-R", "S").expect("line present");
        assert_eq!(removed.size, "S");
        assert_eq!(session.summary().vat_base, Decimal::new(5250, 2));
        assert!(session.remove(4).is_none());

        session.clear();
        assert!(session.lines().is_empty());
        assert_eq!(session.summary().grand_total, Decimal::ZERO);
    }

    #[test]
    fn session_accepts_custom_pricing_engine() {
        struct FlatEngine;

        impl PricingEngine for FlatEngine {
            fn price(&self, lines: &[OfferLine]) -> PricingSummary {
                let total = Decimal::from(lines.len() as u64);
                PricingSummary {
                    items_net: total,
                    branding_net: Decimal::ZERO,
                    vat_base: total,
                    vat_amount: Decimal::ZERO,
                    grand_total: total,
                    trace: PricingTrace { currency: "EUR".to_string(), steps: Vec::new() },
                }
            }
        }

        let mut session =
            QuoteSession::with_engine(today(), &OfferConfig { validity_days: 7 }, FlatEngine);
        session.add_selection(&catalog(), &selection("Red", &["S", "M"])).expect("add red");

        assert_eq!(session.summary().grand_total, Decimal::from(2u64));
        assert_eq!(session.document().summary.vat_base, Decimal::from(2u64));
    }
}
