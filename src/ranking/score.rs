//! Stock-coverage scoring and keyword demotion.
//!
//! Scores are computed fresh every run and never persisted. Coverage is a
//! three-level summary of how many of a product's variants have available
//! stock:
//!
//! - `2` — every variant in stock (and the product has variants)
//! - `1` — some variants in stock
//! - `0` — nothing in stock (a product with zero variants scores 0)
//!
//! Demotion forces a product to the end of the order regardless of stock:
//! any configured keyword matching the title, product type, or a tag as a
//! caseless, accent-insensitive *substring* demotes the product (keyword
//! `sale` matches `Wholesale Kit`).

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::types::{InventoryLevel, Product};

/// Score tuple for one product, the sole input to the sorter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredProduct {
    pub id: String,
    pub title: String,
    /// 0 = no stock, 1 = partial, 2 = full coverage.
    pub coverage_score: u8,
    pub total_inventory: i64,
    pub variants_with_stock: usize,
    pub total_variants: usize,
    pub demoted: bool,
}

/// Matching normalization: NFD-decompose, strip combining marks, lowercase.
///
/// Collapses case and diacritics so `LIQUIDACIÓN` matches `liquidacion`.
pub fn normalize(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Keyword lists that force products to the end of the order.
///
/// Keywords are normalized once at construction; matching is substring
/// containment over normalized text.
#[derive(Debug, Clone, Default)]
pub struct DemotionRules {
    title_keywords: Vec<String>,
    tag_keywords: Vec<String>,
    product_type_keywords: Vec<String>,
}

impl DemotionRules {
    pub fn new(
        title_keywords: &[String],
        tag_keywords: &[String],
        product_type_keywords: &[String],
    ) -> Self {
        let prep = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|k| normalize(k.trim()))
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            title_keywords: prep(title_keywords),
            tag_keywords: prep(tag_keywords),
            product_type_keywords: prep(product_type_keywords),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title_keywords.is_empty()
            && self.tag_keywords.is_empty()
            && self.product_type_keywords.is_empty()
    }

    /// Whether any keyword matches the product's title, type, or tags.
    pub fn is_demoted(&self, product: &Product) -> bool {
        let title = normalize(&product.title);
        if self.title_keywords.iter().any(|k| title.contains(k)) {
            return true;
        }

        let ptype = normalize(&product.product_type);
        if self
            .product_type_keywords
            .iter()
            .any(|k| ptype.contains(k))
        {
            return true;
        }

        product.tags.iter().any(|tag| {
            let tag = normalize(tag);
            self.tag_keywords.iter().any(|k| tag.contains(k))
        })
    }
}

/// Available stock for one variant, honoring the location allow-list.
///
/// An empty allow-list counts every location. With a non-empty list,
/// levels at unlisted locations (or with no location at all) contribute 0.
fn variant_available(levels: &[InventoryLevel], allowed_locations: &[String]) -> i64 {
    levels
        .iter()
        .filter(|lvl| {
            allowed_locations.is_empty()
                || lvl
                    .location_id
                    .as_ref()
                    .is_some_and(|id| allowed_locations.contains(id))
        })
        .map(|lvl| lvl.available)
        .sum()
}

/// Compute the score tuple for one product. Pure, no I/O.
pub fn score_product(
    product: &Product,
    rules: &DemotionRules,
    allowed_locations: &[String],
) -> ScoredProduct {
    let total_variants = product.variants.len();
    let mut variants_with_stock = 0usize;
    let mut total_inventory = 0i64;

    for variant in &product.variants {
        let available = variant_available(&variant.inventory_levels, allowed_locations);
        total_inventory += available;
        if available > 0 {
            variants_with_stock += 1;
        }
    }

    let coverage_score = if variants_with_stock == 0 {
        0
    } else if variants_with_stock == total_variants {
        2
    } else {
        1
    };

    ScoredProduct {
        id: product.id.clone(),
        title: product.title.clone(),
        coverage_score,
        total_inventory,
        variants_with_stock,
        total_variants,
        demoted: rules.is_demoted(product),
    }
}
