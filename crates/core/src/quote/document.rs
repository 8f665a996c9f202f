use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::offer::{BrandingInfo, CustomerInfo, Offer};
use crate::quote::grouping::{group_lines, LineGroup};
use crate::quote::pricing::{round_money, PricingEngine, PricingSummary, VAT_RATE};

pub const BLANK_PLACEHOLDER: &str = "........................";

/// Everything the document renderer needs, already grouped and priced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDocument {
    pub customer: CustomerInfo,
    pub branding: BrandingInfo,
    pub technology_label: String,
    pub groups: Vec<LineGroup>,
    pub summary: PricingSummary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    pub amount: String,
    pub emphasized: bool,
}

impl QuoteDocument {
    pub fn compose(offer: &Offer, engine: &dyn PricingEngine) -> Self {
        Self {
            customer: offer.customer.clone(),
            branding: offer.branding.clone(),
            technology_label: offer.branding.technology.label().to_string(),
            groups: group_lines(offer.lines()),
            summary: engine.price(offer.lines()),
        }
    }

    pub fn line_count(&self) -> usize {
        self.groups.iter().map(LineGroup::row_span).sum()
    }

    pub fn company_or_placeholder(&self) -> &str {
        or_placeholder(&self.customer.company)
    }

    pub fn prepared_by_or_placeholder(&self) -> &str {
        or_placeholder(&self.customer.prepared_by)
    }

    pub fn valid_until_label(&self) -> String {
        format_date(self.customer.valid_until)
    }

    pub fn sample_date_label(&self) -> String {
        format_date(self.branding.sample_date)
    }

    pub fn summary_lines(&self) -> Vec<SummaryLine> {
        let vat_percent = (VAT_RATE * Decimal::ONE_HUNDRED).normalize();
        let line = |label: String, amount: Decimal, emphasized: bool| SummaryLine {
            label,
            amount: format_money(amount),
            emphasized,
        };

        vec![
            line("Suma položiek bez DPH".to_string(), self.summary.items_net, false),
            line("Branding celkom bez DPH".to_string(), self.summary.branding_net, false),
            line("Základ DPH".to_string(), self.summary.vat_base, true),
            line(format!("DPH ({vat_percent}%)"), self.summary.vat_amount, false),
            line("CELKOM S DPH".to_string(), self.summary.grand_total, true),
        ]
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        BLANK_PLACEHOLDER
    } else {
        value
    }
}

pub fn format_money(amount: Decimal) -> String {
    format!("{:.2} €", round_money(amount))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d. %m. %Y").to_string()
}
