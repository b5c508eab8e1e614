//! Fulfillment normalization.
//!
//! The fulfillment oracle answers "what can each store sell me" with loosely
//! shaped data: metadata split between a nested `store` object and top-level
//! fields, costs that are sometimes explicit and sometimes `price ×
//! quantity`, ids and names under varying keys, any field possibly absent.
//! Normalization happens exactly once, here, at the system boundary -
//! everything downstream works on [`StoreRecord`] and never re-guesses field
//! names. Fulfillment data is never discarded, only defaulted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::FulfillmentError;
use crate::types::{de_lenient_f64, de_opt_f64, de_opt_id, IngredientLine};
use crate::units::unit_for_category;

/// Placeholder for a store that came back without a name.
pub const DEFAULT_STORE_NAME: &str = "Cửa hàng";
/// Placeholder for a store that came back without an address.
pub const DEFAULT_STORE_ADDRESS: &str = "Không có địa chỉ";
/// Bucket for products without a category.
pub const DEFAULT_CATEGORY: &str = "Khác";
/// Placeholder for a product that came back without a name.
pub const DEFAULT_PRODUCT_NAME: &str = "Sản phẩm";

/// Raw fulfillment payload: the oracle sends either one store entry or an
/// array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFulfillment {
    Many(Vec<RawStoreEntry>),
    One(Box<RawStoreEntry>),
}

/// Store metadata as it appears nested under `store`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStoreMeta {
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(alias = "name_vi")]
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub stars: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub distance: Option<f64>,
    pub chain: Option<String>,
}

/// One store's raw fulfillment entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawStoreEntry {
    pub store: Option<RawStoreMeta>,
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(alias = "name_vi")]
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub stars: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub distance: Option<f64>,
    pub chain: Option<String>,
    #[serde(alias = "total_cost", deserialize_with = "de_opt_f64")]
    pub total_cost: Option<f64>,
    pub products: Vec<RawPricedItem>,
    #[serde(alias = "similar_products")]
    pub similar_products: Vec<RawPricedItem>,
    #[serde(alias = "lack_ingredients")]
    pub lack_ingredients: Vec<RawProduct>,
}

/// One priced line of a raw entry: a product plus how it was priced and, for
/// alternatives, which original product position it can replace.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPricedItem {
    pub product: Option<RawProduct>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub quantity: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub cost: Option<f64>,
    pub product_index: Option<u32>,
}

/// Product fields as the oracle sends them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(alias = "name_vi")]
    pub name: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub price: Option<f64>,
    pub category: Option<String>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub quantity: f64,
}

/// A normalized, fully-priced product line within a store record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    pub id: String,
    pub name: String,
    pub image: String,
    pub price: f64,
    pub quantity: f64,
    /// Final line cost: explicit cost, else `price × quantity`, else 0.
    pub cost: f64,
    pub category: String,
    /// Position of the requested product this line answers (for
    /// alternatives, the position of the original they can replace).
    pub product_index: u32,
    #[serde(default)]
    pub is_alternative: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_product_id: Option<String>,
}

/// Products grouped under one category, in first-seen category order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: String,
    pub products: Vec<PricedProduct>,
}

/// The canonical per-store fulfillment record.
///
/// Created fresh on every fulfillment response, mutated in place only by
/// [`crate::substitute::substitute`], discarded when a new request is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub distance: f64,
    pub chain: Option<String>,
    /// Always equals the sum of `products[].cost` after normalization and
    /// after every substitution.
    pub total_price: f64,
    pub products: Vec<PricedProduct>,
    pub similar_products_by_index: HashMap<u32, Vec<PricedProduct>>,
    pub products_by_category: Vec<CategoryGroup>,
    /// Ingredients the store could not match to any product at all (not
    /// items merely priced at zero).
    pub lack_ingredients: Vec<IngredientLine>,
}

impl StoreRecord {
    /// Alternatives that can replace the product at `product_index`. A
    /// missing key means the same thing as an empty group: no alternatives.
    pub fn alternatives_for(&self, product_index: u32) -> &[PricedProduct] {
        self.similar_products_by_index
            .get(&product_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Normalize a raw fulfillment payload into canonical store records.
/// Always produces an array, whether the oracle sent one entry or many.
pub fn normalize(raw: RawFulfillment) -> Vec<StoreRecord> {
    let entries = match raw {
        RawFulfillment::Many(entries) => entries,
        RawFulfillment::One(entry) => vec![*entry],
    };
    entries.into_iter().map(normalize_entry).collect()
}

/// Parse and normalize a fulfillment payload straight from its serialized
/// form. Fails only when the blob is not an object or array at all.
pub fn normalize_json(blob: &str) -> Result<Vec<StoreRecord>, FulfillmentError> {
    let raw: RawFulfillment = serde_json::from_str(blob)?;
    Ok(normalize(raw))
}

fn normalize_entry(entry: RawStoreEntry) -> StoreRecord {
    let meta = entry.store.unwrap_or_default();

    let id = meta
        .id
        .or(entry.id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let name = match meta.name.or(entry.name) {
        Some(name) => name,
        None => {
            warn!(store_id = %id, "store entry missing name, defaulting");
            DEFAULT_STORE_NAME.to_string()
        }
    };
    let address = match meta.address.or(entry.address) {
        Some(address) => address,
        None => {
            warn!(store_id = %id, "store entry missing address, defaulting");
            DEFAULT_STORE_ADDRESS.to_string()
        }
    };
    let rating = meta
        .rating
        .or(entry.rating)
        .or(meta.stars)
        .or(entry.stars)
        .unwrap_or(0.0);
    let distance = meta.distance.or(entry.distance).unwrap_or(0.0);
    let chain = meta.chain.or(entry.chain);

    let products: Vec<PricedProduct> = entry
        .products
        .into_iter()
        .enumerate()
        .map(|(position, item)| normalize_product(item, position as u32))
        .collect();

    let mut similar_products_by_index: HashMap<u32, Vec<PricedProduct>> = HashMap::new();
    for item in entry.similar_products {
        // An alternative without a productIndex has nothing to point at;
        // default it into the first slot rather than dropping it.
        let index = item.product_index.unwrap_or_else(|| {
            debug!("similar product missing productIndex, defaulting to 0");
            0
        });
        similar_products_by_index
            .entry(index)
            .or_default()
            .push(normalize_product(item, index));
    }

    let products_by_category = group_by_category(&products);

    let declared_total = entry.total_cost.unwrap_or(0.0);
    let total_price = if declared_total != 0.0 {
        declared_total
    } else {
        products.iter().map(|p| p.cost).sum()
    };

    let lack_ingredients = entry
        .lack_ingredients
        .into_iter()
        .map(normalize_lack_ingredient)
        .collect();

    StoreRecord {
        id,
        name,
        address,
        rating,
        distance,
        chain,
        total_price,
        products,
        similar_products_by_index,
        products_by_category,
        lack_ingredients,
    }
}

fn normalize_product(item: RawPricedItem, product_index: u32) -> PricedProduct {
    let product = item.product.unwrap_or_default();
    let id = product.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let price = product.price.unwrap_or(0.0);
    let quantity = item.quantity.unwrap_or(1.0);
    let cost = match item.cost {
        Some(cost) => cost,
        None => price * quantity,
    };
    let category = product
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    PricedProduct {
        id,
        name: product
            .name
            .unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
        image: product.image.unwrap_or_default(),
        price,
        quantity,
        cost,
        category,
        product_index: item.product_index.unwrap_or(product_index),
        is_alternative: false,
        original_product_id: None,
    }
}

fn normalize_lack_ingredient(raw: RawProduct) -> IngredientLine {
    let category = raw
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    IngredientLine {
        id: raw.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: raw.name.unwrap_or_default(),
        image: raw.image.unwrap_or_default(),
        quantity: raw.quantity,
        unit: unit_for_category(&category),
        category,
    }
}

/// Group products by resolved category, preserving first-seen order.
pub(crate) fn group_by_category(products: &[PricedProduct]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for product in products {
        match groups.iter_mut().find(|g| g.category == product.category) {
            Some(group) => group.products.push(product.clone()),
            None => groups.push(CategoryGroup {
                category: product.category.clone(),
                products: vec![product.clone()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Vec<StoreRecord> {
        normalize(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_single_entry_becomes_array() {
        let records = parse(json!({
            "store": {"name": "Bách hóa Xanh", "address": "12 Lê Lợi"},
            "products": []
        }));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Bách hóa Xanh");
    }

    #[test]
    fn test_missing_identity_defaults_instead_of_dropping() {
        let records = parse(json!([{"products": []}]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, DEFAULT_STORE_NAME);
        assert_eq!(records[0].address, DEFAULT_STORE_ADDRESS);
        assert!(!records[0].id.is_empty());
    }

    #[test]
    fn test_cost_falls_back_to_price_times_quantity() {
        let records = parse(json!({
            "products": [
                {"product": {"id": "p1", "price": 500.0}, "quantity": 3},
                {"product": {"id": "p2", "price": 200.0}, "quantity": 2, "cost": 999.0},
                {"product": {"id": "p3"}}
            ]
        }));
        let products = &records[0].products;
        assert_eq!(products[0].cost, 1500.0);
        assert_eq!(products[1].cost, 999.0);
        assert_eq!(products[2].cost, 0.0);
    }

    #[test]
    fn test_zero_declared_total_sums_product_costs() {
        let records = parse(json!({
            "totalCost": 0,
            "products": [
                {"product": {"id": "p1"}, "cost": 1000.0},
                {"product": {"id": "p2"}, "cost": 2000.0}
            ]
        }));
        assert_eq!(records[0].total_price, 3000.0);
    }

    #[test]
    fn test_nonzero_declared_total_wins() {
        let records = parse(json!({
            "totalCost": 5000.0,
            "products": [{"product": {"id": "p1"}, "cost": 1000.0}]
        }));
        assert_eq!(records[0].total_price, 5000.0);
    }

    #[test]
    fn test_rating_falls_back_to_stars() {
        let records = parse(json!([
            {"rating": 4.5, "stars": 3.0, "products": []},
            {"stars": 3.0, "products": []},
            {"products": []}
        ]));
        assert_eq!(records[0].rating, 4.5);
        assert_eq!(records[1].rating, 3.0);
        assert_eq!(records[2].rating, 0.0);
    }

    #[test]
    fn test_similar_products_grouped_by_index() {
        let records = parse(json!({
            "products": [
                {"product": {"id": "p0"}, "cost": 100.0},
                {"product": {"id": "p1"}, "cost": 200.0}
            ],
            "similarProducts": [
                {"product": {"id": "alt-a"}, "cost": 90.0, "productIndex": 1},
                {"product": {"id": "alt-b"}, "cost": 95.0, "productIndex": 1}
            ]
        }));
        let store = &records[0];
        assert_eq!(store.alternatives_for(1).len(), 2);
        assert!(store.alternatives_for(0).is_empty());
        // missing key and empty group are equivalent
        assert!(store.alternatives_for(99).is_empty());
    }

    #[test]
    fn test_products_grouped_by_category_first_seen_order() {
        let records = parse(json!({
            "products": [
                {"product": {"id": "p0", "category": "Rau củ"}},
                {"product": {"id": "p1", "category": "Thịt"}},
                {"product": {"id": "p2", "category": "Rau củ"}},
                {"product": {"id": "p3"}}
            ]
        }));
        let groups = &records[0].products_by_category;
        let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(categories, vec!["Rau củ", "Thịt", DEFAULT_CATEGORY]);
        assert_eq!(groups[0].products.len(), 2);
    }

    #[test]
    fn test_lack_ingredients_normalized_independently() {
        let records = parse(json!({
            "products": [],
            "lackIngredients": [
                {"name": "rau má"},
                {"id": 7, "name": "trà sữa", "category": "Đồ uống"}
            ]
        }));
        let lack = &records[0].lack_ingredients;
        assert_eq!(lack.len(), 2);
        assert!(!lack[0].id.is_empty());
        assert_eq!(lack[0].category, DEFAULT_CATEGORY);
        assert_eq!(lack[1].id, "7");
        assert_eq!(lack[1].unit, crate::units::Unit::Milliliter);
    }

    #[test]
    fn test_name_vi_and_image_url_aliases() {
        let records = parse(json!({
            "products": [
                {"product": {"id": "p0", "name_vi": "cà rốt", "imageUrl": "https://img/p0"}}
            ]
        }));
        let product = &records[0].products[0];
        assert_eq!(product.name, "cà rốt");
        assert_eq!(product.image, "https://img/p0");
    }

    #[test]
    fn test_empty_payload_is_valid() {
        assert!(normalize_json("[]").unwrap().is_empty());
    }

    #[test]
    fn test_garbage_payload_fails_fast() {
        assert!(normalize_json("\"not a fulfillment\"").is_err());
        assert!(normalize_json("12").is_err());
    }
}
