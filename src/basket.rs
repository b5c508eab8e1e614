//! The basket store: canonical basket state and its mutation API.
//!
//! The store is an explicit state container the host injects wherever basket
//! access is needed; there is no ambient global. Every committed mutation
//! notifies registered subscribers synchronously with the new state, and the
//! host persists the snapshot however it likes (see [`Basket::to_json`]).
//! Mutations are applied one at a time in submission order; each reads the
//! latest committed state.

use tracing::debug;

use crate::types::{Basket, DishEntry, IngredientLine};
use crate::units::unit_for_category;

/// Handle returned by [`BasketStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&Basket) + Send + Sync>;

/// A new standalone ingredient for [`BasketStore::add_ingredient`].
///
/// Quantity starts at 1 (a unit count) and the unit is inferred from the
/// category, so neither is taken from the caller.
#[derive(Debug, Clone, Default)]
pub struct NewIngredient {
    pub id: String,
    pub name: String,
    pub image: String,
    pub category: String,
}

/// Owns the canonical basket and serializes all mutations to it.
#[derive(Default)]
pub struct BasketStore {
    basket: Basket,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl BasketStore {
    /// An empty basket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously persisted snapshot.
    pub fn from_snapshot(basket: Basket) -> Self {
        BasketStore {
            basket,
            ..Self::default()
        }
    }

    /// The current committed state.
    pub fn basket(&self) -> &Basket {
        &self.basket
    }

    /// Register a callback invoked synchronously after every committed
    /// mutation. No-op mutations do not notify.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&Basket) + Send + Sync + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    /// Add a standalone ingredient. If a line with the same id already
    /// exists its quantity goes up by 1; otherwise a new line is appended
    /// with quantity 1 and unit inferred from the category.
    pub fn add_ingredient(&mut self, new: NewIngredient) -> &Basket {
        if let Some(existing) = self.basket.ingredients.iter_mut().find(|l| l.id == new.id) {
            existing.quantity += 1.0;
        } else {
            let unit = unit_for_category(&new.category);
            self.basket.ingredients.push(IngredientLine {
                id: new.id,
                name: new.name,
                image: new.image,
                quantity: 1.0,
                unit,
                category: new.category,
            });
        }
        self.commit()
    }

    /// Add a dish. Duplicate dish ids are silently ignored (the caller is
    /// expected to warn the user beforehand), as are dishes with no
    /// ingredients - an empty dish may never exist in the basket.
    pub fn add_dish(&mut self, mut dish: DishEntry) -> &Basket {
        if self.basket.dish(&dish.id).is_some() {
            debug!(dish_id = %dish.id, "duplicate dish ignored");
            return &self.basket;
        }
        if dish.ingredients.is_empty() {
            debug!(dish_id = %dish.id, "dish with no ingredients ignored");
            return &self.basket;
        }
        dish.servings = dish.servings.max(1);
        self.basket.dishes.push(dish);
        self.commit()
    }

    /// Adjust a standalone line's quantity by `delta`; a result of zero or
    /// less removes the line. Unknown ids are a no-op.
    pub fn update_ingredient_quantity(&mut self, id: &str, delta: f64) -> &Basket {
        let Some(pos) = self.basket.ingredients.iter().position(|l| l.id == id) else {
            return &self.basket;
        };
        self.basket.ingredients[pos].quantity += delta;
        if self.basket.ingredients[pos].quantity <= 0.0 {
            self.basket.ingredients.remove(pos);
        }
        self.commit()
    }

    /// Same rule as [`Self::update_ingredient_quantity`], scoped to one
    /// dish's recipe. Servings are untouched. A dish whose last ingredient
    /// is removed is itself removed in the same mutation.
    pub fn update_dish_ingredient_quantity(
        &mut self,
        dish_id: &str,
        ingredient_id: &str,
        delta: f64,
    ) -> &Basket {
        let Some(dish_pos) = self.basket.dishes.iter().position(|d| d.id == dish_id) else {
            return &self.basket;
        };
        let dish = &mut self.basket.dishes[dish_pos];
        let Some(pos) = dish.ingredients.iter().position(|l| l.id == ingredient_id) else {
            return &self.basket;
        };
        dish.ingredients[pos].quantity += delta;
        if dish.ingredients[pos].quantity <= 0.0 {
            dish.ingredients.remove(pos);
        }
        if dish.ingredients.is_empty() {
            self.basket.dishes.remove(dish_pos);
        }
        self.commit()
    }

    /// Change a dish's servings. Zero deletes the dish entirely (policy,
    /// not an error). Unknown ids are a no-op.
    pub fn update_dish_servings(&mut self, dish_id: &str, servings: u32) -> &Basket {
        let Some(pos) = self.basket.dishes.iter().position(|d| d.id == dish_id) else {
            return &self.basket;
        };
        if servings == 0 {
            self.basket.dishes.remove(pos);
        } else {
            self.basket.dishes[pos].servings = servings;
        }
        self.commit()
    }

    /// Remove a standalone line unconditionally. Unknown ids are a no-op.
    pub fn remove_ingredient(&mut self, id: &str) -> &Basket {
        let before = self.basket.ingredients.len();
        self.basket.ingredients.retain(|l| l.id != id);
        if self.basket.ingredients.len() == before {
            return &self.basket;
        }
        self.commit()
    }

    /// Remove a dish unconditionally. Unknown ids are a no-op.
    pub fn remove_dish(&mut self, dish_id: &str) -> &Basket {
        let before = self.basket.dishes.len();
        self.basket.dishes.retain(|d| d.id != dish_id);
        if self.basket.dishes.len() == before {
            return &self.basket;
        }
        self.commit()
    }

    /// Sum of all standalone quantities plus every dish's raw per-serving
    /// ingredient quantities.
    ///
    /// Deliberately NOT scaled by servings: this is the header-badge count
    /// of line quantities, a distinct operation from the servings-aware
    /// totals in [`crate::aggregate::combine`]. Keep the two separate.
    pub fn total_item_count(&self) -> f64 {
        let standalone: f64 = self.basket.ingredients.iter().map(|l| l.quantity).sum();
        let in_dishes: f64 = self
            .basket
            .dishes
            .iter()
            .flat_map(|d| d.ingredients.iter())
            .map(|l| l.quantity)
            .sum();
        standalone + in_dishes
    }

    /// Reset to the empty basket.
    pub fn clear(&mut self) -> &Basket {
        self.basket = Basket::default();
        self.commit()
    }

    fn commit(&mut self) -> &Basket {
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.basket);
        }
        &self.basket
    }
}
