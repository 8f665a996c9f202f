//! Best-effort discovery of the record element and field names of a feed whose schema is
//! not known in advance.
//!
//! Candidates are tried in list order and the first one whose records expose enough
//! recognized fields wins. Supporting a new feed shape means appending a candidate or an
//! alias; the resolver itself stays a pure function of the document and the list.

use std::collections::{BTreeMap, BTreeSet};

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MIN_FIELDS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogField {
    Code,
    Name,
    Color,
    Size,
    Price,
    Image,
}

/// Case-insensitive mapping from observed field names to canonical fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldAliases {
    entries: BTreeMap<String, CatalogField>,
}

impl FieldAliases {
    pub fn empty() -> Self {
        Self { entries: BTreeMap::new() }
    }

    pub fn standard() -> Self {
        const ALIASES: &[(&str, CatalogField)] = &[
            ("code", CatalogField::Code),
            ("kod", CatalogField::Code),
            ("kod_it", CatalogField::Code),
            ("item_id", CatalogField::Code),
            ("itemid", CatalogField::Code),
            ("sku", CatalogField::Code),
            ("id", CatalogField::Code),
            ("name", CatalogField::Name),
            ("nazov", CatalogField::Name),
            ("skupinovy_nazov", CatalogField::Name),
            ("product", CatalogField::Name),
            ("productname", CatalogField::Name),
            ("product_name", CatalogField::Name),
            ("title", CatalogField::Name),
            ("color", CatalogField::Color),
            ("colour", CatalogField::Color),
            ("farba", CatalogField::Color),
            ("size", CatalogField::Size),
            ("velkost", CatalogField::Size),
            ("rozmer", CatalogField::Size),
            ("price", CatalogField::Price),
            ("cena", CatalogField::Price),
            ("price_vat", CatalogField::Price),
            ("unit_price", CatalogField::Price),
            ("image", CatalogField::Image),
            ("img", CatalogField::Image),
            ("imgurl", CatalogField::Image),
            ("img_product", CatalogField::Image),
            ("image_url", CatalogField::Image),
            ("obrazok", CatalogField::Image),
        ];

        ALIASES.iter().fold(Self::empty(), |aliases, (alias, field)| aliases.with_alias(alias, *field))
    }

    pub fn with_alias(mut self, alias: &str, field: CatalogField) -> Self {
        self.entries.insert(alias.trim().to_lowercase(), field);
        self
    }

    pub fn lookup(&self, observed: &str) -> Option<CatalogField> {
        self.entries.get(&observed.trim().to_lowercase()).copied()
    }

    fn names_for(&self, field: CatalogField) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(move |(_, mapped)| **mapped == field).map(|(name, _)| name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordSelector {
    /// Any element whose local name is one of these (case-insensitive).
    NamedElements(Vec<String>),
    /// Every element child of every element child of the root.
    Grandchildren,
    /// Any element with a child element whose name aliases the given field.
    ParentOfField(CatalogField),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaCandidate {
    pub name: String,
    pub selector: RecordSelector,
    pub aliases: FieldAliases,
}

impl SchemaCandidate {
    pub fn new(name: impl Into<String>, selector: RecordSelector, aliases: FieldAliases) -> Self {
        Self { name: name.into(), selector, aliases }
    }
}

pub fn default_candidates() -> Vec<SchemaCandidate> {
    let record_names =
        ["item", "row", "product", "shopitem", "entry", "polozka"].map(str::to_owned).to_vec();

    vec![
        SchemaCandidate::new(
            "named-records",
            RecordSelector::NamedElements(record_names),
            FieldAliases::standard(),
        ),
        SchemaCandidate::new("grandchildren", RecordSelector::Grandchildren, FieldAliases::standard()),
        SchemaCandidate::new(
            "key-parent",
            RecordSelector::ParentOfField(CatalogField::Code),
            FieldAliases::standard(),
        ),
    ]
}

/// One feed record with its recognized fields. Values are raw, untrimmed text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub fields: BTreeMap<CatalogField, String>,
}

impl RawRecord {
    pub fn get(&self, field: CatalogField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFeed {
    pub candidate: String,
    pub records: Vec<RawRecord>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("no record selector matched (tried: {})", tried.join(", "))]
    NoMatchingSelector { tried: Vec<String> },
    #[error("records matched by `{candidate}` carry neither a name nor a price field")]
    NoRecognizableFields { candidate: String },
}

pub fn resolve(
    document: &Document<'_>,
    candidates: &[SchemaCandidate],
    min_fields: usize,
) -> Result<ResolvedFeed, SchemaError> {
    for candidate in candidates {
        let records: Vec<RawRecord> = select_records(document, candidate)
            .into_iter()
            .map(|node| extract_record(node, &candidate.aliases))
            .collect();
        if records.is_empty() {
            continue;
        }

        let distinct: BTreeSet<CatalogField> =
            records.iter().flat_map(|record| record.fields.keys().copied()).collect();
        if distinct.len() <= min_fields {
            continue;
        }

        let identifiable = records.iter().any(|record| {
            record.fields.contains_key(&CatalogField::Name)
                || record.fields.contains_key(&CatalogField::Price)
        });
        if !identifiable {
            return Err(SchemaError::NoRecognizableFields { candidate: candidate.name.clone() });
        }

        return Ok(ResolvedFeed { candidate: candidate.name.clone(), records });
    }

    Err(SchemaError::NoMatchingSelector {
        tried: candidates.iter().map(|candidate| candidate.name.clone()).collect(),
    })
}

fn select_records<'a, 'input>(
    document: &'a Document<'input>,
    candidate: &SchemaCandidate,
) -> Vec<Node<'a, 'input>> {
    let root = document.root_element();
    match &candidate.selector {
        RecordSelector::NamedElements(names) => {
            let is_record = |node: &Node<'_, '_>| {
                node.is_element() && {
                    let local = node.tag_name().name();
                    names.iter().any(|name| name.eq_ignore_ascii_case(local))
                }
            };
            // A record name used as a field inside another record (`<item><product>`) is a field.
            root.descendants()
                .filter(|node| is_record(node))
                .filter(|node| !node.ancestors().skip(1).any(|ancestor| is_record(&ancestor)))
                .collect()
        }
        RecordSelector::Grandchildren => root
            .children()
            .filter(|node| node.is_element())
            .flat_map(|child| child.children().filter(|node| node.is_element()))
            .collect(),
        RecordSelector::ParentOfField(field) => {
            let key_names: Vec<&str> = candidate.aliases.names_for(*field).collect();
            root.descendants()
                .filter(|node| node.is_element())
                .filter(|node| {
                    node.children().filter(|child| child.is_element()).any(|child| {
                        let local = child.tag_name().name();
                        key_names.iter().any(|key| key.eq_ignore_ascii_case(local))
                    })
                })
                .collect()
        }
    }
}

fn extract_record(node: Node<'_, '_>, aliases: &FieldAliases) -> RawRecord {
    let mut record = RawRecord::default();

    for attribute in node.attributes() {
        if let Some(field) = aliases.lookup(attribute.name()) {
            record.fields.entry(field).or_insert_with(|| attribute.value().to_owned());
        }
    }

    let mut from_children: BTreeSet<CatalogField> = BTreeSet::new();
    for child in node.children().filter(|child| child.is_element()) {
        let Some(field) = aliases.lookup(child.tag_name().name()) else {
            continue;
        };
        // First child element wins; it also overrides an attribute of the same field.
        if from_children.insert(field) {
            record.fields.insert(field, element_text(child));
        }
    }

    record
}

fn element_text(node: Node<'_, '_>) -> String {
    node.descendants().filter(|descendant| descendant.is_text()).filter_map(|text| text.text()).collect()
}

#[cfg(test)]
mod tests {
    use roxmltree::Document;

    use super::{
        default_candidates, resolve, CatalogField, FieldAliases, RecordSelector, SchemaCandidate,
        SchemaError, DEFAULT_MIN_FIELDS,
    };

    fn resolve_default(xml: &str) -> Result<super::ResolvedFeed, SchemaError> {
        let document = Document::parse(xml).expect("test xml is well formed");
        resolve(&document, &default_candidates(), DEFAULT_MIN_FIELDS)
    }

    #[test]
    fn heureka_style_shopitems_resolve_by_name() {
        let xml = r#"<SHOP>
            <SHOPITEM>
                <ITEM_ID>B02E-M</ITEM_ID>
                <PRODUCTNAME>Polo</PRODUCTNAME>
                <PRICE_VAT>10,50</PRICE_VAT>
                <IMGURL>https://img.example.com/polo.jpg</IMGURL>
                <DESCRIPTION>ignored</DESCRIPTION>
            </SHOPITEM>
        </SHOP>"#;
        let resolved = resolve_default(xml).expect("resolvable");

        assert_eq!(resolved.candidate, "named-records");
        assert_eq!(resolved.records.len(), 1);
        let record = &resolved.records[0];
        assert_eq!(record.get(CatalogField::Code), Some("B02E-M"));
        assert_eq!(record.get(CatalogField::Name), Some("Polo"));
        assert_eq!(record.get(CatalogField::Price), Some("10,50"));
        assert_eq!(record.fields.len(), 4);
    }

    #[test]
    fn record_names_nested_inside_records_are_fields() {
        let xml = r#"<items>
            <item><code>A1</code><product>Polo</product><price>9.90</price></item>
            <item><code>A2</code><product>Tee</product><price>4.55</price></item>
        </items>"#;
        let resolved = resolve_default(xml).expect("resolvable");

        assert_eq!(resolved.candidate, "named-records");
        assert_eq!(resolved.records.len(), 2);
        let names: Vec<&str> =
            resolved.records.iter().filter_map(|record| record.get(CatalogField::Name)).collect();
        assert_eq!(names, vec!["Polo", "Tee"]);
    }

    #[test]
    fn unknown_record_names_fall_back_to_grandchildren() {
        let xml = r#"<export>
            <meta><generated>2026-10-19</generated></meta>
            <zoznam>
                <tovar><KOD>T1</KOD><NAZOV>Tee</NAZOV><FARBA>White</FARBA><CENA>4.55</CENA></tovar>
                <tovar><KOD>T2</KOD><NAZOV>Tee</NAZOV><FARBA>Black</FARBA><CENA>4.89</CENA></tovar>
            </zoznam>
        </export>"#;
        let resolved = resolve_default(xml).expect("resolvable");

        assert_eq!(resolved.candidate, "grandchildren");
        let codes: Vec<&str> =
            resolved.records.iter().filter_map(|record| record.get(CatalogField::Code)).collect();
        assert_eq!(codes, vec!["T1", "T2"]);
    }

    #[test]
    fn attributes_count_as_fields_and_children_override_them() {
        let xml = r#"<feed>
            <row code="A1" name="from attribute" color="Red"><name>Polo</name><size>M</size></row>
        </feed>"#;
        let resolved = resolve_default(xml).expect("resolvable");
        let record = &resolved.records[0];

        assert_eq!(record.get(CatalogField::Code), Some("A1"));
        assert_eq!(record.get(CatalogField::Name), Some("Polo"));
        assert_eq!(record.get(CatalogField::Size), Some("M"));
    }

    #[test]
    fn wrapper_nodes_with_too_few_fields_are_skipped() {
        // `item` elements exist but only carry an id, so the named selector is rejected and
        // the key-parent selector finds the real record.
        let xml = r#"<catalog>
            <index><item><id>1</id></item></index>
            <data><group><goods><id>A1</id><title>Polo</title><cena>9.90</cena></goods></group></data>
        </catalog>"#;
        let resolved = resolve_default(xml).expect("resolvable");

        assert_eq!(resolved.candidate, "key-parent");
        let named: Vec<&str> =
            resolved.records.iter().filter_map(|record| record.get(CatalogField::Name)).collect();
        assert_eq!(named, vec!["Polo"]);
    }

    #[test]
    fn unrecognized_shapes_fail_with_tried_selectors() {
        let error = resolve_default("<a><b><c>1</c></b></a>").expect_err("unresolvable");

        assert_eq!(
            error,
            SchemaError::NoMatchingSelector {
                tried: vec![
                    "named-records".to_string(),
                    "grandchildren".to_string(),
                    "key-parent".to_string()
                ]
            }
        );
    }

    #[test]
    fn records_without_name_or_price_are_rejected() {
        let xml = r#"<feed><row><code>A</code><color>Red</color><size>M</size></row></feed>"#;
        let error = resolve_default(xml).expect_err("no identity fields");

        assert!(matches!(error, SchemaError::NoRecognizableFields { ref candidate } if candidate == "named-records"));
    }

    #[test]
    fn appended_candidates_extend_recognized_shapes() {
        let xml = r#"<lager><artikel><nr>9</nr><bezeichnung>Jacke</bezeichnung><preis>30</preis></artikel></lager>"#;
        let document = Document::parse(xml).expect("well formed");

        let mut candidates = default_candidates();
        assert!(resolve(&document, &candidates, DEFAULT_MIN_FIELDS).is_err());

        candidates.push(SchemaCandidate::new(
            "german-artikel",
            RecordSelector::NamedElements(vec!["artikel".to_string()]),
            FieldAliases::empty()
                .with_alias("nr", CatalogField::Code)
                .with_alias("Bezeichnung", CatalogField::Name)
                .with_alias("preis", CatalogField::Price),
        ));
        let resolved = resolve(&document, &candidates, DEFAULT_MIN_FIELDS).expect("resolvable");

        assert_eq!(resolved.candidate, "german-artikel");
        assert_eq!(resolved.records[0].get(CatalogField::Name), Some("Jacke"));
    }
}
