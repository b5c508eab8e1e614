//! Store ranking.

use std::cmp::Ordering;

use crate::normalize::StoreRecord;

/// Rating first (higher wins), distance breaks ties (closer wins).
///
/// Deterministic for equal-rating, equal-distance inputs; any preservation
/// of original relative order beyond that is incidental, not a contract.
pub fn compare_stores(a: &StoreRecord, b: &StoreRecord) -> Ordering {
    b.rating
        .total_cmp(&a.rating)
        .then_with(|| a.distance.total_cmp(&b.distance))
}

/// Order store records best-first for display.
pub fn rank_stores(stores: &mut [StoreRecord]) {
    stores.sort_by(compare_stores);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn stores(value: serde_json::Value) -> Vec<StoreRecord> {
        normalize(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_higher_rating_wins_regardless_of_distance() {
        let mut records = stores(serde_json::json!([
            {"name": "A", "rating": 3.0, "distance": 0.2, "products": []},
            {"name": "B", "rating": 4.5, "distance": 9.0, "products": []}
        ]));
        rank_stores(&mut records);
        assert_eq!(records[0].name, "B");
    }

    #[test]
    fn test_equal_rating_closer_store_wins() {
        let mut records = stores(serde_json::json!([
            {"name": "far", "rating": 4.0, "distance": 5.0, "products": []},
            {"name": "near", "rating": 4.0, "distance": 1.2, "products": []}
        ]));
        rank_stores(&mut records);
        assert_eq!(records[0].name, "near");
    }

    #[test]
    fn test_missing_rating_ranks_last() {
        let mut records = stores(serde_json::json!([
            {"name": "unrated", "distance": 0.1, "products": []},
            {"name": "starred", "stars": 2.0, "distance": 8.0, "products": []}
        ]));
        rank_stores(&mut records);
        assert_eq!(records[0].name, "starred");
    }
}
