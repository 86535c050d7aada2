//! Data structures exchanged between callers, the engine, and collaborators.

use serde::{Deserialize, Serialize};
use starknet::core::types::Felt;
use starknet::core::utils::get_contract_address;

use crate::ImportError;

/// Highest accepted royalty rate, in percent.
pub const MAX_ROYALTY_RATE: u8 = 100;

/// A single ownership record submitted for migration.
///
/// Immutable once submitted. The `origin_tag` is the canonical identity of
/// the source token, `<sourceCollection>/<sourceTokenId>`, and is globally
/// unique by contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Metadata URI the destination token is minted with.
    pub metadata_uri: String,
    /// Receiver of the minted token.
    pub recipient: Felt,
    /// Creator credited on the destination token.
    pub creator: Felt,
    /// Non-transferable marker.
    #[serde(default)]
    pub soul_bound: bool,
    /// Canonical identity of the source token.
    pub origin_tag: String,
    /// Royalty rate in percent, at most [`MAX_ROYALTY_RATE`].
    #[serde(default)]
    pub royalty_rate: u8,
    /// Origin tag of a parent token already present in the destination
    /// registry. When set, the parent's nested-ownership account receives
    /// the import instead of `recipient`.
    #[serde(default)]
    pub nested_parent_tag: Option<String>,
}

impl ImportRecord {
    /// Build the mint request for this record with the resolved recipient.
    pub fn mint_request(&self, recipient: Felt) -> MintRequest {
        MintRequest {
            recipient,
            metadata_uri: self.metadata_uri.clone(),
            royalty_rate: self.royalty_rate,
            soul_bound: self.soul_bound,
            creator: self.creator,
            origin_tag: self.origin_tag.clone(),
        }
    }
}

/// Payload handed to [`crate::CollectionRegistry::mint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    pub recipient: Felt,
    pub metadata_uri: String,
    pub royalty_rate: u8,
    pub soul_bound: bool,
    pub creator: Felt,
    pub origin_tag: String,
}

/// Outcome of one import attempt, one per record in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub origin_tag: String,
    /// Index of the newly minted token; `None` when the import failed.
    pub token_index: Option<u64>,
    pub success: bool,
    pub reason: Option<String>,
}

impl ImportResult {
    /// Result for a record that was admitted and minted at `token_index`.
    pub fn admitted(origin_tag: impl Into<String>, token_index: u64) -> Self {
        Self {
            origin_tag: origin_tag.into(),
            token_index: Some(token_index),
            success: true,
            reason: None,
        }
    }

    /// Result for a record that was rejected.
    pub fn rejected(origin_tag: impl Into<String>, error: &ImportError) -> Self {
        Self {
            origin_tag: origin_tag.into(),
            token_index: None,
            success: false,
            reason: Some(error.to_string()),
        }
    }
}

/// Per-actor import counters. Counters never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStats {
    pub total_imported: u64,
    pub total_failed: u64,
    /// Unix timestamp of the most recent successful import.
    pub last_import_time: Option<i64>,
}

/// Parameter tuple a nested-ownership account address is derived from.
///
/// Derivation is a pure function of this tuple: equal tuples always yield
/// the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountParams {
    /// Account implementation the address is bound to.
    pub implementation: Felt,
    /// Chain the parent token lives on.
    pub chain_id: Felt,
    /// Destination collection holding the parent token.
    pub token_contract: Felt,
    /// Index of the parent token within `token_contract`.
    pub token_index: u64,
    pub salt: Felt,
}

impl AccountParams {
    /// Deterministic destination address for this parameter tuple.
    pub fn address(&self) -> Felt {
        get_contract_address(
            self.salt,
            self.implementation,
            &[self.chain_id, self.token_contract, Felt::from(self.token_index)],
            self.token_contract,
        )
    }
}
