use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::CatalogEntry;

/// A priced row of the offer. Product fields are copied out of the catalog so a later
/// catalog reload never changes lines that were already added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferLine {
    pub code: String,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount_percent: u8,
    pub branding_unit_price: Decimal,
    pub image_ref: String,
}

impl OfferLine {
    pub fn from_entry(
        entry: &CatalogEntry,
        quantity: u32,
        discount_percent: u8,
        branding_unit_price: Decimal,
        image_ref: String,
    ) -> Self {
        Self {
            code: entry.code.clone(),
            product_name: entry.product_name.clone(),
            color: entry.color.clone(),
            size: entry.size.clone(),
            quantity,
            unit_price: entry.unit_price,
            discount_percent,
            branding_unit_price,
            image_ref,
        }
    }

    pub fn is_same_variant(&self, code: &str, size: &str) -> bool {
        self.code == code && self.size == size
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandingTechnology {
    #[default]
    ScreenPrint,
    Embroidery,
    Dtf,
    Laser,
    Sublimation,
    PadPrint,
}

impl BrandingTechnology {
    pub const ALL: [Self; 6] = [
        Self::ScreenPrint,
        Self::Embroidery,
        Self::Dtf,
        Self::Laser,
        Self::Sublimation,
        Self::PadPrint,
    ];

    /// Label printed on the offer document.
    pub fn label(self) -> &'static str {
        match self {
            Self::ScreenPrint => "Sieťotlač",
            Self::Embroidery => "Výšivka",
            Self::Dtf => "DTF",
            Self::Laser => "Laser",
            Self::Sublimation => "Subli",
            Self::PadPrint => "Tampoprint",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub company: String,
    pub address: String,
    pub contact: String,
    pub valid_until: NaiveDate,
    pub prepared_by: String,
}

impl CustomerInfo {
    pub fn blank(today: NaiveDate, validity_days: u32) -> Self {
        let valid_until = today.checked_add_days(Days::new(u64::from(validity_days))).unwrap_or(today);
        Self {
            company: String::new(),
            address: String::new(),
            contact: String::new(),
            valid_until,
            prepared_by: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingInfo {
    pub technology: BrandingTechnology,
    pub description: String,
    pub sample_date: NaiveDate,
}

impl BrandingInfo {
    pub fn blank(today: NaiveDate) -> Self {
        Self { technology: BrandingTechnology::default(), description: String::new(), sample_date: today }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub customer: CustomerInfo,
    pub branding: BrandingInfo,
    lines: Vec<OfferLine>,
}

impl Offer {
    pub fn new(customer: CustomerInfo, branding: BrandingInfo) -> Self {
        Self { customer, branding, lines: Vec::new() }
    }

    pub fn blank(today: NaiveDate, validity_days: u32) -> Self {
        Self::new(CustomerInfo::blank(today, validity_days), BrandingInfo::blank(today))
    }

    pub fn lines(&self) -> &[OfferLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, code: &str, size: &str) -> bool {
        self.lines.iter().any(|line| line.is_same_variant(code, size))
    }

    /// Appends unless a line for the same `(code, size)` is already present.
    pub(crate) fn push_unique(&mut self, line: OfferLine) -> bool {
        if self.contains(&line.code, &line.size) {
            return false;
        }
        self.lines.push(line);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<OfferLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn remove_line(&mut self, code: &str, size: &str) -> Option<OfferLine> {
        let index = self.lines.iter().position(|line| line.is_same_variant(code, size))?;
        Some(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
