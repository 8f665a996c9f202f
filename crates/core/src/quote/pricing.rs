use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::offer::OfferLine;

/// Fixed VAT rate (23 %).
pub const VAT_RATE: Decimal = Decimal::from_parts(23, 0, 0, false, 2);
pub const CURRENCY: &str = "EUR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub currency: String,
    pub steps: Vec<PricingTraceStep>,
}

/// Offer totals, each rounded to cents once from the full-precision accumulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSummary {
    pub items_net: Decimal,
    pub branding_net: Decimal,
    pub vat_base: Decimal,
    pub vat_amount: Decimal,
    pub grand_total: Decimal,
    pub trace: PricingTrace,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, lines: &[OfferLine]) -> PricingSummary;
}

#[derive(Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, lines: &[OfferLine]) -> PricingSummary {
        price_lines(lines)
    }
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// Arithmetic below saturates at `Decimal::MAX` so pricing never panics on absurd inputs.

pub fn discounted_unit(line: &OfferLine) -> Decimal {
    let discount = Decimal::from(line.discount_percent) / Decimal::ONE_HUNDRED;
    line.unit_price.saturating_mul(Decimal::ONE - discount)
}

pub fn line_items_net(line: &OfferLine) -> Decimal {
    Decimal::from(line.quantity).saturating_mul(discounted_unit(line))
}

pub fn line_branding_net(line: &OfferLine) -> Decimal {
    Decimal::from(line.quantity).saturating_mul(line.branding_unit_price)
}

pub fn line_total(line: &OfferLine) -> Decimal {
    let unit = discounted_unit(line).saturating_add(line.branding_unit_price);
    Decimal::from(line.quantity).saturating_mul(unit)
}

pub fn price_lines(lines: &[OfferLine]) -> PricingSummary {
    let mut items_net_exact = Decimal::ZERO;
    let mut branding_net_exact = Decimal::ZERO;
    for line in lines {
        items_net_exact = items_net_exact.saturating_add(line_items_net(line));
        branding_net_exact = branding_net_exact.saturating_add(line_branding_net(line));
    }

    let vat_base_exact = items_net_exact.saturating_add(branding_net_exact);
    let vat_amount_exact = vat_base_exact.saturating_mul(VAT_RATE);
    let grand_total_exact = vat_base_exact.saturating_mul(Decimal::ONE + VAT_RATE);

    let vat_base = round_money(vat_base_exact);
    let vat_amount = round_money(vat_amount_exact);
    let grand_total = round_money(grand_total_exact);

    debug!(
        event_name = "pricing.summary.computed",
        line_count = lines.len(),
        vat_base = %vat_base,
        grand_total = %grand_total,
        "offer priced"
    );

    PricingSummary {
        items_net: round_money(items_net_exact),
        branding_net: round_money(branding_net_exact),
        vat_base,
        vat_amount,
        grand_total,
        trace: PricingTrace {
            currency: CURRENCY.to_string(),
            steps: vec![
                PricingTraceStep {
                    stage: "items_net".to_string(),
                    detail: "sum(quantity * unit_price * (1 - discount_percent / 100))".to_string(),
                    amount: items_net_exact,
                },
                PricingTraceStep {
                    stage: "branding_net".to_string(),
                    detail: "sum(quantity * branding_unit_price)".to_string(),
                    amount: branding_net_exact,
                },
                PricingTraceStep {
                    stage: "vat_base".to_string(),
                    detail: "items_net + branding_net".to_string(),
                    amount: vat_base_exact,
                },
                PricingTraceStep {
                    stage: "vat_amount".to_string(),
                    detail: format!("vat_base * {VAT_RATE}"),
                    amount: vat_amount_exact,
                },
                PricingTraceStep {
                    stage: "grand_total".to_string(),
                    detail: format!("vat_base * {}", Decimal::ONE + VAT_RATE),
                    amount: grand_total_exact,
                },
            ],
        },
    }
}
