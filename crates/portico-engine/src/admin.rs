//! Administrative operations, gated on a single authority.
//!
//! None of these interact with the migration algorithm; they exist to
//! recover from mistaken admissions and to manage the engine's credited
//! balance.

use starknet::core::types::Felt;

use portico_core::ImportError;

use crate::importer::ImportEngine;

impl ImportEngine {
    /// Current administrative authority.
    pub fn authority(&self) -> Felt {
        *self.authority.lock().unwrap()
    }

    fn require_authority(&self, caller: Felt) -> Result<(), ImportError> {
        if caller != self.authority() {
            return Err(ImportError::AuthorizationRequired);
        }
        Ok(())
    }

    /// Hand the administrative role to `new_authority`.
    pub fn transfer_authority(
        &self,
        caller: Felt,
        new_authority: Felt,
    ) -> Result<(), ImportError> {
        self.require_authority(caller)?;
        if new_authority == Felt::ZERO {
            return Err(ImportError::ZeroAddress("authority"));
        }
        *self.authority.lock().unwrap() = new_authority;
        tracing::info!(
            target: "portico::admin",
            new_authority = %format!("{new_authority:#x}"),
            "authority transferred"
        );
        Ok(())
    }

    /// Emergency-clear one origin tag from the admitted set so it can be
    /// imported again. Returns whether the tag was present.
    pub fn clear_admitted(&self, caller: Felt, origin_tag: &str) -> Result<bool, ImportError> {
        self.require_authority(caller)?;
        let removed = self
            .store
            .clear(self.collection.identity(), origin_tag)
            .map_err(|error| ImportError::Store(error.to_string()))?;
        tracing::info!(
            target: "portico::admin",
            origin = %origin_tag,
            removed,
            "admitted origin cleared"
        );
        Ok(removed)
    }

    /// Credit value to the engine, e.g. caller-attached materialization
    /// fees.
    pub fn credit(&self, amount: u128) {
        *self.held_balance.lock().unwrap() += amount;
    }

    /// Balance currently held by the engine.
    pub fn held_balance(&self) -> u128 {
        *self.held_balance.lock().unwrap()
    }

    /// Withdraw the engine's whole held balance.
    pub fn withdraw(&self, caller: Felt) -> Result<u128, ImportError> {
        self.require_authority(caller)?;
        let mut balance = self.held_balance.lock().unwrap();
        let withdrawn = std::mem::take(&mut *balance);
        tracing::info!(target: "portico::admin", withdrawn, "balance withdrawn");
        Ok(withdrawn)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::EngineConfig, store::DedupStore};
    use portico_core::ImportRecord;
    use portico_testing::{MemoryAccountRegistry, MemoryCollectionRegistry};

    const AUTHORITY: Felt = Felt::from_hex_unchecked("0xad");
    const STRANGER: Felt = Felt::from_hex_unchecked("0xbad");

    fn engine() -> ImportEngine {
        ImportEngine::new(
            Arc::new(MemoryCollectionRegistry::new(Felt::from_hex_unchecked(
                "0x900",
            ))),
            Arc::new(MemoryAccountRegistry::new()),
            DedupStore::in_memory().unwrap(),
            EngineConfig::default(),
            AUTHORITY,
        )
    }

    #[test]
    fn authority_gates_every_operation() {
        let engine = engine();
        assert_eq!(
            engine.transfer_authority(STRANGER, STRANGER),
            Err(ImportError::AuthorizationRequired)
        );
        assert_eq!(
            engine.clear_admitted(STRANGER, "0xAAA/1"),
            Err(ImportError::AuthorizationRequired)
        );
        assert_eq!(
            engine.withdraw(STRANGER),
            Err(ImportError::AuthorizationRequired)
        );
    }

    #[test]
    fn authority_can_be_transferred_once_only_by_the_holder() {
        let engine = engine();
        engine.transfer_authority(AUTHORITY, STRANGER).unwrap();
        assert_eq!(engine.authority(), STRANGER);

        assert_eq!(
            engine.transfer_authority(AUTHORITY, AUTHORITY),
            Err(ImportError::AuthorizationRequired)
        );
        assert_eq!(
            engine.transfer_authority(STRANGER, Felt::ZERO),
            Err(ImportError::ZeroAddress("authority"))
        );
    }

    #[tokio::test]
    async fn clear_removes_the_admission() {
        let engine = engine();
        let record = ImportRecord {
            metadata_uri: "ipfs://x".into(),
            recipient: Felt::from_hex_unchecked("0xa"),
            creator: Felt::from_hex_unchecked("0xb"),
            soul_bound: false,
            origin_tag: "0xC/1".into(),
            royalty_rate: 0,
            nested_parent_tag: None,
        };

        assert!(engine.import_one(&record, AUTHORITY).await.success);
        assert!(engine.clear_admitted(AUTHORITY, "0xC/1").unwrap());
        assert!(!engine.is_admitted("0xC/1").unwrap());
    }

    #[test]
    fn withdraw_drains_the_balance() {
        let engine = engine();
        engine.credit(40);
        engine.credit(2);
        assert_eq!(engine.held_balance(), 42);
        assert_eq!(engine.withdraw(AUTHORITY), Ok(42));
        assert_eq!(engine.held_balance(), 0);
        assert_eq!(engine.withdraw(AUTHORITY), Ok(0));
    }
}
