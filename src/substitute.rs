//! Substitution: swapping a priced line for an approved alternative.

use tracing::debug;

use crate::normalize::StoreRecord;

/// Replace the product `product_id` in `store` with the alternative
/// `alternative_id`, drawn from the store's similar-products pool.
///
/// The replacement keeps the original line's position, product index and
/// category group - groupings reflect the shopping list's ask, not the
/// substitute's own taxonomy. `total_price` is recomputed exactly. Returns
/// `false` (and mutates nothing) when either id cannot be found; re-applying
/// the same substitution is idempotent. The displaced product joins the
/// similar pool, so reverting means substituting the original product back
/// in as the "alternative" - which clears the substitution tags again.
pub fn substitute(store: &mut StoreRecord, product_id: &str, alternative_id: &str) -> bool {
    let Some(pos) = store.products.iter().position(|p| p.id == product_id) else {
        debug!(store_id = %store.id, product_id, "substitution target not in products");
        return false;
    };

    let Some(alternative) = store
        .similar_products_by_index
        .values()
        .flatten()
        .find(|p| p.id == alternative_id)
        .cloned()
    else {
        debug!(store_id = %store.id, alternative_id, "alternative not in similar pool");
        return false;
    };

    let original = store.products[pos].clone();
    // A line that is already an alternative keeps pointing at the root
    // original, so re-selecting the same alternative yields the same state.
    let root_id = original
        .original_product_id
        .clone()
        .unwrap_or_else(|| original.id.clone());

    let mut replacement = alternative;
    replacement.product_index = original.product_index;
    // The line stays bucketed under the ask's category.
    replacement.category = original.category.clone();
    if replacement.id == root_id {
        // Substituting the original back in is a revert, not a substitution.
        replacement.is_alternative = false;
        replacement.original_product_id = None;
    } else {
        replacement.is_alternative = true;
        replacement.original_product_id = Some(root_id);
    }

    // Keep the displaced product reachable as an alternative so the swap
    // can be undone later.
    let in_pool = store
        .similar_products_by_index
        .values()
        .flatten()
        .any(|p| p.id == original.id);
    if !in_pool {
        store
            .similar_products_by_index
            .entry(original.product_index)
            .or_default()
            .push(original.clone());
    }

    store.products[pos] = replacement.clone();

    if let Some(group) = store
        .products_by_category
        .iter_mut()
        .find(|g| g.category == original.category)
    {
        if let Some(group_pos) = group.products.iter().position(|p| p.id == original.id) {
            group.products[group_pos] = replacement;
        }
    }

    store.total_price = store.products.iter().map(|p| p.cost).sum();
    true
}
