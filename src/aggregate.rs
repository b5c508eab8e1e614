//! Ingredient aggregation.
//!
//! Combines a basket's standalone lines and dish recipes into one
//! deduplicated shopping list. Pure functions over the basket snapshot; the
//! combined list is never persisted, it's recomputed on demand.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Basket;
use crate::units::Unit;

/// Quantities below this (or unparseable ones) still count for something, so
/// an item never silently disappears from the shopping list.
const QUANTITY_FLOOR: f64 = 0.1;

/// One entry of the combined shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedItem {
    pub id: String,
    pub name: String,
    pub image: String,
    /// Total across all sources, rounded to one decimal place.
    pub total_quantity: f64,
    pub unit: Unit,
    pub category: String,
}

/// Combine a basket into a single shopping list: one entry per distinct
/// ingredient id across standalone lines and every dish, with dish
/// quantities scaled by servings.
///
/// Output order is first-encounter order: standalone lines first, then
/// dishes in basket order. Name, image, unit and category come from
/// whichever source line was seen first for that id.
pub fn combine(basket: &Basket) -> Vec<CombinedItem> {
    let mut slot_by_id: HashMap<String, usize> = HashMap::new();
    let mut items: Vec<CombinedItem> = Vec::new();

    let mut merge = |line: &crate::types::IngredientLine, multiplier: f64| {
        let contribution = floor_quantity(line.quantity) * multiplier;
        match slot_by_id.get(&line.id) {
            Some(&slot) => items[slot].total_quantity += contribution,
            None => {
                slot_by_id.insert(line.id.clone(), items.len());
                items.push(CombinedItem {
                    id: line.id.clone(),
                    name: line.name.clone(),
                    image: line.image.clone(),
                    total_quantity: contribution,
                    unit: line.unit,
                    category: line.category.clone(),
                });
            }
        }
    };

    for line in &basket.ingredients {
        merge(line, 1.0);
    }
    for dish in &basket.dishes {
        let servings = dish.servings.max(1) as f64;
        for line in &dish.ingredients {
            merge(line, servings);
        }
    }

    for item in &mut items {
        item.total_quantity = round_one_decimal(item.total_quantity);
    }
    items
}

/// Treat missing, junk or non-positive quantities as a small non-zero
/// amount instead of hiding the item.
fn floor_quantity(quantity: f64) -> f64 {
    if quantity.is_finite() && quantity > 0.0 {
        quantity
    } else {
        QUANTITY_FLOOR
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
