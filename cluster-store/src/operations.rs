//! Error taxonomy for store operations (spec §7.3): upstream parent
//! failures surface to the calling client as HTTP 503; a missing key
//! surfaces as 404. Grounded on `rabia-kvstore/src/operations.rs`'s
//! `StoreError` (`is_recoverable`/`is_client_error`) idiom, mapped onto
//! this system's narrower 200/404/503 taxonomy.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Neither the local cache nor (if queried) the parent has the key.
    #[error("key not found")]
    NotFound,
    /// The parent could not be reached or returned something other than
    /// success/not-found while this node was trying to propagate or fault
    /// upward.
    #[error("upstream parent unreachable: {0}")]
    ParentUnreachable(String),
}

impl StoreError {
    pub fn http_status(&self) -> u16 {
        match self {
            StoreError::NotFound => 404,
            StoreError::ParentUnreachable(_) => 503,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
