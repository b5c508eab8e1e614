//! Fulfillment request supersession.
//!
//! One fulfillment request is outstanding per basket snapshot. Starting a
//! new request supersedes any in-flight one: a result delivered against a
//! stale token is discarded, never merged with the current state.

use tracing::debug;

use crate::normalize::StoreRecord;

/// Token identifying one fulfillment round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Tracks the current fulfillment result and which request it belongs to.
#[derive(Default)]
pub struct FulfillmentSession {
    generation: u64,
    records: Vec<StoreRecord>,
}

impl FulfillmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding any outstanding one.
    pub fn begin(&mut self) -> RequestToken {
        self.generation += 1;
        RequestToken(self.generation)
    }

    /// Install the result of a completed request. Returns `false` and keeps
    /// the current state when the token has been superseded.
    pub fn accept(&mut self, token: RequestToken, records: Vec<StoreRecord>) -> bool {
        if token.0 != self.generation {
            debug!(
                stale = token.0,
                current = self.generation,
                "discarding superseded fulfillment result"
            );
            return false;
        }
        self.records = records;
        true
    }

    /// The current ranked result, empty until a request completes.
    pub fn records(&self) -> &[StoreRecord] {
        &self.records
    }

    /// Mutable access for in-place substitution on the current result.
    pub fn records_mut(&mut self) -> &mut [StoreRecord] {
        &mut self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_json;

    #[test]
    fn test_current_token_installs_result() {
        let mut session = FulfillmentSession::new();
        let token = session.begin();
        let records = normalize_json(r#"[{"name": "A", "products": []}]"#).unwrap();
        assert!(session.accept(token, records));
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn test_stale_token_is_discarded() {
        let mut session = FulfillmentSession::new();
        let stale = session.begin();
        let current = session.begin();
        let old = normalize_json(r#"[{"name": "old", "products": []}]"#).unwrap();
        let new = normalize_json(r#"[{"name": "new", "products": []}]"#).unwrap();
        assert!(session.accept(current, new));
        assert!(!session.accept(stale, old));
        assert_eq!(session.records()[0].name, "new");
    }

    #[test]
    fn test_empty_until_first_result() {
        let session = FulfillmentSession::new();
        assert!(session.records().is_empty());
    }
}
