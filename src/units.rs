//! Measurement units and category-based unit inference.
//!
//! Ingredient lines don't carry a unit when they enter the basket; the unit
//! is derived from the ingredient's category at creation time and stays fixed
//! for the life of the line. Beverages are measured by volume, everything
//! else by mass.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The single category whose items are measured by volume.
pub const VOLUMETRIC_CATEGORY: &str = "Đồ uống";

/// Measurement unit for an ingredient line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    Gram,
    Milliliter,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Milliliter => "ml",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Unit strings in snapshots come from upstream services that are not strict
// about vocabulary; anything we don't recognize as volume falls back to mass.
impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Other(IgnoredAny),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => match s.trim().to_lowercase().as_str() {
                "ml" | "l" | "lit" | "lít" | "milliliter" | "millilit" => Unit::Milliliter,
                _ => Unit::Gram,
            },
            Raw::Other(_) => Unit::Gram,
        })
    }
}

/// Infer the unit for an ingredient from its category.
pub fn unit_for_category(category: &str) -> Unit {
    if category.trim() == VOLUMETRIC_CATEGORY {
        Unit::Milliliter
    } else {
        Unit::Gram
    }
}
