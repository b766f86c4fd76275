//! Stores
//!
//! Every record belongs to a store; Postgres policies scope rows to the store
//! set on the transaction.

use crate::uuids::TypedUuid;

/// Store marker for typed identifiers.
#[derive(Debug)]
pub struct Store;

/// Store UUID
pub type StoreUuid = TypedUuid<Store>;
