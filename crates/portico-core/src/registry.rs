//! Boundary traits for the external collaborators the engine drives.

use anyhow::Result;
use async_trait::async_trait;
use starknet::core::types::Felt;

use crate::{AccountParams, MintRequest};

/// Append-only destination collection that mints migrated tokens and
/// stores the origin tag of each.
///
/// Token indices run `1..=total_count()`; indices whose token was burned
/// remain allocated but fail to read.
#[async_trait]
pub trait CollectionRegistry: Send + Sync {
    /// Identity of the collection. Zero means unconfigured.
    fn identity(&self) -> Felt;

    /// Mint a new token, returning its index in the collection.
    ///
    /// A rejection carries the registry's reason, which callers surface
    /// verbatim.
    async fn mint(&self, request: &MintRequest) -> Result<u64>;

    /// Read the stored origin tag at `index`.
    async fn origin_tag(&self, index: u64) -> Result<String>;

    /// Total number of token slots ever allocated.
    async fn total_count(&self) -> Result<u64>;
}

/// Registry that materializes deterministic nested-ownership accounts.
///
/// The address for a parameter tuple is fixed by
/// [`AccountParams::address`]; materializing it twice is a no-op, not an
/// error.
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    /// Ensure the account for `params` exists, returning its address.
    async fn materialize(&self, params: &AccountParams) -> Result<Felt>;
}
