pub mod aggregate;
pub mod basket;
pub mod error;
pub mod normalize;
pub mod rank;
pub mod session;
pub mod substitute;
pub mod types;
pub mod units;

pub use aggregate::{combine, CombinedItem};
pub use basket::{BasketStore, NewIngredient, SubscriptionId};
pub use error::{BasketError, FulfillmentError};
pub use normalize::{
    normalize, normalize_json, CategoryGroup, PricedProduct, RawFulfillment, StoreRecord,
};
pub use rank::{compare_stores, rank_stores};
pub use session::{FulfillmentSession, RequestToken};
pub use substitute::substitute;
pub use types::{Basket, DishEntry, IngredientLine};
pub use units::{unit_for_category, Unit};
