use thiserror::Error;

#[derive(Error, Debug)]
pub enum BasketError {
    #[error("Invalid basket snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum FulfillmentError {
    #[error("Invalid fulfillment payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
