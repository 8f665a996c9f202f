use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::catalog::Catalog;
use crate::domain::offer::{Offer, OfferLine};
use crate::errors::DomainError;

pub const MAX_QUANTITY: u32 = 5_000;
pub const MAX_DISCOUNT_PERCENT: u8 = 100;
pub const MAX_BRANDING_UNIT_PRICE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// One "add to offer" action: a product/color pair with one or more sizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSelection {
    pub product_name: String,
    pub color: String,
    pub sizes: Vec<String>,
    pub quantity: u32,
    pub discount_percent: u8,
    pub branding_unit_price: Decimal,
    pub custom_image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub code: String,
    pub size: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub added: Vec<VariantKey>,
    pub duplicates: Vec<VariantKey>,
    pub missing_sizes: Vec<String>,
}

impl AddOutcome {
    pub fn changed_offer(&self) -> bool {
        !self.added.is_empty()
    }
}

pub fn validate_selection(selection: &OfferSelection) -> Result<(), DomainError> {
    if selection.quantity == 0 || selection.quantity > MAX_QUANTITY {
        return Err(DomainError::InvalidSelection {
            field: "quantity",
            message: format!("must be in range 1..={MAX_QUANTITY}, got {}", selection.quantity),
        });
    }

    if selection.discount_percent > MAX_DISCOUNT_PERCENT {
        return Err(DomainError::InvalidSelection {
            field: "discount_percent",
            message: format!(
                "must be in range 0..={MAX_DISCOUNT_PERCENT}, got {}",
                selection.discount_percent
            ),
        });
    }

    let branding = selection.branding_unit_price;
    if branding.is_sign_negative() || branding > MAX_BRANDING_UNIT_PRICE {
        return Err(DomainError::InvalidSelection {
            field: "branding_unit_price",
            message: format!("must be in range 0..={MAX_BRANDING_UNIT_PRICE}, got {branding}"),
        });
    }

    Ok(())
}

/// Appends one line per requested size that exists in the catalog. Sizes missing from the
/// catalog and variants already on the offer are skipped; lines of one call are appended
/// as a contiguous block.
pub fn add_selection(
    offer: &mut Offer,
    catalog: &Catalog,
    selection: &OfferSelection,
) -> Result<AddOutcome, DomainError> {
    validate_selection(selection)?;

    let custom_image = selection
        .custom_image
        .as_deref()
        .map(str::trim)
        .filter(|link| !link.is_empty());

    let mut outcome = AddOutcome::default();
    for size in &selection.sizes {
        let Some(entry) = catalog.find(&selection.product_name, &selection.color, size) else {
            debug!(
                event_name = "offer.line.selection_miss",
                product_name = %selection.product_name,
                color = %selection.color,
                size = %size,
                "size not present in catalog, nothing appended"
            );
            outcome.missing_sizes.push(size.clone());
            continue;
        };

        let image_ref = custom_image.map(str::to_owned).unwrap_or_else(|| entry.image_ref.clone());
        let line = OfferLine::from_entry(
            entry,
            selection.quantity,
            selection.discount_percent,
            selection.branding_unit_price,
            image_ref,
        );
        let key = VariantKey { code: line.code.clone(), size: line.size.clone() };

        if offer.push_unique(line) {
            outcome.added.push(key);
        } else {
            outcome.duplicates.push(key);
        }
    }

    info!(
        event_name = "offer.line.added",
        product_name = %selection.product_name,
        color = %selection.color,
        added = outcome.added.len(),
        duplicates = outcome.duplicates.len(),
        missing = outcome.missing_sizes.len(),
        "selection applied to offer"
    );

    Ok(outcome)
}
