use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::offer::OfferLine;
use crate::quote::pricing::{discounted_unit, line_total};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    #[serde(flatten)]
    pub line: OfferLine,
    pub discounted_unit: Decimal,
    pub line_total: Decimal,
}

impl PricedLine {
    pub fn new(line: &OfferLine) -> Self {
        Self { line: line.clone(), discounted_unit: discounted_unit(line), line_total: line_total(line) }
    }
}

/// Lines sharing a `(product_name, color)` pair, printed under one image cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineGroup {
    pub product_name: String,
    pub color: String,
    pub image_ref: String,
    pub rows: Vec<PricedLine>,
}

impl LineGroup {
    pub fn row_span(&self) -> usize {
        self.rows.len()
    }
}

/// Stable partition of the offer lines by `(product_name, color)`.
///
/// Groups appear in the order their key is first seen and keep the relative order of
/// their lines, so lines of the same pair added by separate actions still share a group.
/// The group image is taken from its first line.
pub fn group_lines(lines: &[OfferLine]) -> Vec<LineGroup> {
    let mut groups: Vec<LineGroup> = Vec::new();
    let mut index_by_key: HashMap<(&str, &str), usize> = HashMap::new();

    for line in lines {
        let key = (line.product_name.as_str(), line.color.as_str());
        let index = *index_by_key.entry(key).or_insert_with(|| {
            groups.push(LineGroup {
                product_name: line.product_name.clone(),
                color: line.color.clone(),
                image_ref: line.image_ref.clone(),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[index].rows.push(PricedLine::new(line));
    }

    groups
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::group_lines;
    use crate::domain::offer::OfferLine;

    fn line(name: &str, color: &str, size: &str, image: &str) -> OfferLine {
        OfferLine {
            code: format!("{name}-{color}"),
            product_name: name.to_owned(),
            color: color.to_owned(),
            size: size.to_owned(),
            quantity: 2,
            unit_price: Decimal::new(1000, 2),
            discount_percent: 0,
            branding_unit_price: Decimal::ZERO,
            image_ref: image.to_owned(),
        }
    }

    #[test]
    fn sizes_of_one_add_form_one_group_with_shared_image() {
        let lines = vec![line("Polo", "Red", "S", "polo.jpg"), line("Polo", "Red", "M", "polo.jpg")];
        let groups = group_lines(&lines);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].row_span(), 2);
        assert_eq!(groups[0].image_ref, "polo.jpg");
    }

    #[test]
    fn interleaved_lines_are_partitioned_stably() {
        let lines = vec![
            line("Polo", "Red", "S", "red-1.jpg"),
            line("Tee", "White", "M", "tee.jpg"),
            line("Polo", "Red", "XL", "red-2.jpg"),
            line("Polo", "Blue", "M", "blue.jpg"),
        ];
        let groups = group_lines(&lines);

        let shape: Vec<(&str, &str, usize)> = groups
            .iter()
            .map(|group| (group.product_name.as_str(), group.color.as_str(), group.row_span()))
            .collect();
        assert_eq!(shape, vec![("Polo", "Red", 2), ("Tee", "White", 1), ("Polo", "Blue", 1)]);

        let red_sizes: Vec<&str> = groups[0].rows.iter().map(|row| row.line.size.as_str()).collect();
        assert_eq!(red_sizes, vec!["S", "XL"]);
        assert_eq!(groups[0].image_ref, "red-1.jpg");
    }

    #[test]
    fn group_sizes_add_up_to_line_count() {
        let lines = vec![
            line("A", "1", "S", ""),
            line("B", "1", "S", ""),
            line("A", "1", "M", ""),
            line("A", "2", "S", ""),
            line("B", "1", "L", ""),
        ];
        let groups = group_lines(&lines);

        assert_eq!(groups.iter().map(|group| group.row_span()).sum::<usize>(), lines.len());
        assert!(group_lines(&[]).is_empty());
    }

    #[test]
    fn rows_carry_their_own_pricing() {
        let mut discounted = line("Polo", "Red", "M", "");
        discounted.discount_percent = 50;
        let groups = group_lines(&[line("Polo", "Red", "S", ""), discounted]);

        assert_eq!(groups[0].rows[0].line_total, Decimal::new(2000, 2));
        assert_eq!(groups[0].rows[1].discounted_unit, Decimal::new(500, 2));
        assert_eq!(groups[0].rows[1].line_total, Decimal::new(1000, 2));
    }
}
