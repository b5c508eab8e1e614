//! The canonical basket data model.
//!
//! Baskets arrive and leave as serialized blobs; where they are stored is the
//! host's business. Deserialization is deliberately lenient: quantities and
//! ids may show up as numbers or strings depending on which upstream service
//! produced the snapshot, and junk values default rather than fail. Only a
//! blob that isn't the right JSON shape at all is rejected.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BasketError;
use crate::units::Unit;

/// A standalone ingredient line in the basket, or one line of a dish's
/// recipe. Inside a dish, `quantity` is the per-serving amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngredientLine {
    #[serde(deserialize_with = "de_lenient_id")]
    pub id: String,
    pub name: String,
    #[serde(alias = "imageUrl")]
    pub image: String,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub quantity: f64,
    pub unit: Unit,
    pub category: String,
}

/// A dish entry: a fixed recipe scaled by a servings multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DishEntry {
    #[serde(deserialize_with = "de_lenient_id")]
    pub id: String,
    pub name: String,
    #[serde(alias = "imageUrl")]
    pub image: String,
    #[serde(deserialize_with = "de_lenient_servings")]
    pub servings: u32,
    pub ingredients: Vec<IngredientLine>,
}

impl Default for DishEntry {
    fn default() -> Self {
        DishEntry {
            id: String::new(),
            name: String::new(),
            image: String::new(),
            servings: 1,
            ingredients: Vec::new(),
        }
    }
}

/// The user's in-progress shopping cart.
///
/// Ingredient ids are unique within `ingredients`, and a dish id appears at
/// most once in `dishes`. Dishes keep insertion order; the aggregator's
/// output order depends on it. A dish's ingredient list is its own
/// accounting unit - the same ingredient id may also appear standalone, and
/// the two are only merged at aggregation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Basket {
    pub ingredients: Vec<IngredientLine>,
    pub dishes: Vec<DishEntry>,
}

impl Basket {
    /// Parse a basket snapshot from its serialized form.
    pub fn from_json(blob: &str) -> Result<Basket, BasketError> {
        Ok(serde_json::from_str(blob)?)
    }

    /// Serialize the basket for persistence by the host.
    pub fn to_json(&self) -> Result<String, BasketError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.dishes.is_empty()
    }

    pub fn ingredient(&self, id: &str) -> Option<&IngredientLine> {
        self.ingredients.iter().find(|line| line.id == id)
    }

    pub fn dish(&self, id: &str) -> Option<&DishEntry> {
        self.dishes.iter().find(|dish| dish.id == id)
    }
}

/// Accept a number or a numeric string; anything else becomes 0.0.
pub(crate) fn de_lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) if n.is_finite() => n,
        Raw::Text(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Accept a number or a numeric string; anything else is absent.
pub(crate) fn de_opt_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) if n.is_finite() => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Ids come through as strings or numbers depending on the source service.
pub(crate) fn de_lenient_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(de_opt_id(deserializer)?.unwrap_or_default())
}

/// Same as [`de_lenient_id`] but keeps "absent" distinct from empty.
pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Num(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Num(n)) => Some(n.to_string()),
        Some(Raw::Text(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Servings parse as an integer, defaulting to 1 when unparseable.
fn de_lenient_servings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) if n.is_finite() && n >= 0.0 => n as u32,
        Raw::Text(s) => s.trim().parse().unwrap_or(1),
        _ => 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_becomes_string() {
        let line: IngredientLine = serde_json::from_str(r#"{"id": 1, "name": "cà chua"}"#).unwrap();
        assert_eq!(line.id, "1");
    }

    #[test]
    fn test_string_quantity_parses() {
        let line: IngredientLine =
            serde_json::from_str(r#"{"id": "1", "quantity": "2.5"}"#).unwrap();
        assert_eq!(line.quantity, 2.5);
    }

    #[test]
    fn test_junk_quantity_defaults_to_zero() {
        let line: IngredientLine =
            serde_json::from_str(r#"{"id": "1", "quantity": "nhiều"}"#).unwrap();
        assert_eq!(line.quantity, 0.0);
        let line: IngredientLine = serde_json::from_str(r#"{"id": "1", "quantity": null}"#).unwrap();
        assert_eq!(line.quantity, 0.0);
    }

    #[test]
    fn test_servings_default_on_junk() {
        let dish: DishEntry = serde_json::from_str(r#"{"id": "d1", "servings": "abc"}"#).unwrap();
        assert_eq!(dish.servings, 1);
        let dish: DishEntry = serde_json::from_str(r#"{"id": "d1"}"#).unwrap();
        assert_eq!(dish.servings, 1);
        let dish: DishEntry = serde_json::from_str(r#"{"id": "d1", "servings": "3"}"#).unwrap();
        assert_eq!(dish.servings, 3);
    }

    #[test]
    fn test_image_url_alias() {
        let line: IngredientLine =
            serde_json::from_str(r#"{"id": "1", "imageUrl": "https://img/1.jpg"}"#).unwrap();
        assert_eq!(line.image, "https://img/1.jpg");
    }

    #[test]
    fn test_empty_basket_round_trip() {
        let basket = Basket::default();
        let json = basket.to_json().unwrap();
        let back = Basket::from_json(&json).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn test_non_object_snapshot_fails() {
        assert!(Basket::from_json("[1, 2, 3]").is_err());
        assert!(Basket::from_json("not json").is_err());
    }
}
