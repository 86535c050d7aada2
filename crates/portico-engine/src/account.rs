//! Nested-ownership account resolution.
//!
//! The destination address for a token owned by another token is a pure
//! function of [`AccountParams`]; see [`AccountParams::address`]. This
//! module adds the materializing path used by the importer.

use anyhow::{ensure, Context, Result};
use starknet::core::types::Felt;

use portico_core::{AccountParams, AccountRegistry};

/// Compute the account address for `params` and ensure it is materialized.
///
/// Materialization is idempotent: an account that already exists is left
/// untouched. The registry must report the derived address back; anything
/// else means the collaborator derives differently than the engine.
pub async fn resolve_or_create(
    accounts: &dyn AccountRegistry,
    params: &AccountParams,
) -> Result<Felt> {
    let expected = params.address();
    let materialized = accounts
        .materialize(params)
        .await
        .context("materializing nested-ownership account")?;
    ensure!(
        materialized == expected,
        "account registry materialized {materialized:#x}, expected {expected:#x}"
    );

    tracing::debug!(
        target: "portico::account",
        address = %format!("{expected:#x}"),
        parent_index = params.token_index,
        "nested-ownership account resolved"
    );
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_testing::MemoryAccountRegistry;

    fn params(token_index: u64) -> AccountParams {
        AccountParams {
            implementation: Felt::from_hex_unchecked("0x111"),
            chain_id: Felt::from_hex_unchecked("0x534e5f4d41494e"),
            token_contract: Felt::from_hex_unchecked("0x222"),
            token_index,
            salt: Felt::from_hex_unchecked("0x333"),
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(params(7).address(), params(7).address());
    }

    #[test]
    fn derivation_separates_tuples() {
        assert_ne!(params(7).address(), params(8).address());

        let mut other_salt = params(7);
        other_salt.salt = Felt::from_hex_unchecked("0x334");
        assert_ne!(params(7).address(), other_salt.address());
    }

    #[tokio::test]
    async fn materialize_twice_mutates_once() {
        let accounts = MemoryAccountRegistry::new();
        let first = resolve_or_create(&accounts, &params(7)).await.unwrap();
        let second = resolve_or_create(&accounts, &params(7)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(accounts.mutation_count(), 1);
        assert!(accounts.contains(first));
    }
}
