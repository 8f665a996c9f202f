use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Garment sizes in display order. Sizes outside this list sort after it.
pub const SIZE_ORDER: [&str; 11] =
    ["XXS", "XS", "S", "M", "L", "XL", "2XL", "3XL", "4XL", "5XL", "6XL"];

pub fn size_rank(size: &str) -> usize {
    let size = size.trim();
    SIZE_ORDER.iter().position(|known| *known == size).unwrap_or(SIZE_ORDER.len())
}

/// Stable: unknown sizes keep their relative order at the end.
pub fn sort_sizes(sizes: &mut [String]) {
    sizes.sort_by_key(|size| size_rank(size));
}

/// One sellable variant of a product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub unit_price: Decimal,
    pub image_ref: String,
}

impl CatalogEntry {
    pub fn matches(&self, product_name: &str, color: &str, size: &str) -> bool {
        self.product_name == product_name && self.color == color && self.size == size
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, product_name: &str, color: &str, size: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.matches(product_name, color, size))
    }

    pub fn product_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.product_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn colors_for(&self, product_name: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.product_name == product_name)
            .map(|entry| entry.color.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn sizes_for(&self, product_name: &str, color: &str) -> Vec<String> {
        let mut sizes: Vec<String> = Vec::new();
        for entry in &self.entries {
            if entry.product_name == product_name
                && entry.color == color
                && !sizes.contains(&entry.size)
            {
                sizes.push(entry.size.clone());
            }
        }
        sort_sizes(&mut sizes);
        sizes
    }
}
