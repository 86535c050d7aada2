//! Precondition checks for candidate import records.
//!
//! Validation never mutates anything and never treats "not found" as an
//! error, so it can run standalone as a pre-flight over a whole batch
//! before the first mint.

use starknet::core::types::Felt;

use portico_core::{CollectionRegistry, ImportError, ImportRecord, MAX_ROYALTY_RATE};

use crate::{config::EngineConfig, lookup, store::DedupStore};

/// Check `record` against the engine preconditions, short-circuiting at
/// the first violation.
///
/// The admitted-set check and the registry ground-truth check are
/// independent: the dedup store can lag behind a registry that was minted
/// into through another path. An unreadable registry total count degrades
/// the ground-truth check to "not found" rather than blocking the import.
pub async fn validate_record(
    record: &ImportRecord,
    registry: &dyn CollectionRegistry,
    store: &DedupStore,
    config: &EngineConfig,
) -> Result<(), ImportError> {
    if registry.identity() == Felt::ZERO {
        return Err(ImportError::MissingRegistryIdentity);
    }
    if record.metadata_uri.is_empty() {
        return Err(ImportError::EmptyMetadataUri);
    }
    if record.recipient == Felt::ZERO {
        return Err(ImportError::ZeroAddress("recipient"));
    }
    if record.creator == Felt::ZERO {
        return Err(ImportError::ZeroAddress("creator"));
    }
    if record.royalty_rate > MAX_ROYALTY_RATE {
        return Err(ImportError::RoyaltyOutOfRange(record.royalty_rate));
    }
    if record.nested_parent_tag.is_some() && config.account_implementation.is_none() {
        return Err(ImportError::MissingAccountImplementation);
    }

    let contains = store
        .contains(registry.identity(), &record.origin_tag)
        .map_err(|error| ImportError::Store(error.to_string()))?;
    if contains {
        return Err(ImportError::AlreadyImported(record.origin_tag.clone()));
    }

    match lookup::find_by_origin_tag(registry, &record.origin_tag).await {
        Ok(Some(_)) => Err(ImportError::AlreadyImported(record.origin_tag.clone())),
        Ok(None) => Ok(()),
        Err(error) => {
            tracing::warn!(
                target: "portico::validate",
                origin = %record.origin_tag,
                error = %error,
                "registry duplicate check unavailable, proceeding on dedup store only"
            );
            Ok(())
        }
    }
}

/// Pre-flight an entire batch without mutating anything.
///
/// Batch-shape violations (empty, oversized) fail the whole call;
/// otherwise one outcome is returned per record, in input order.
pub async fn validate_batch(
    records: &[ImportRecord],
    registry: &dyn CollectionRegistry,
    store: &DedupStore,
    config: &EngineConfig,
) -> Result<Vec<Result<(), ImportError>>, ImportError> {
    if records.is_empty() {
        return Err(ImportError::EmptyBatch);
    }
    if records.len() > config.max_batch_size {
        return Err(ImportError::BatchTooLarge {
            len: records.len(),
            max: config.max_batch_size,
        });
    }

    let mut outcomes = Vec::with_capacity(records.len());
    for record in records {
        outcomes.push(validate_record(record, registry, store, config).await);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_testing::MemoryCollectionRegistry;

    fn record(origin_tag: &str) -> ImportRecord {
        ImportRecord {
            metadata_uri: "ipfs://meta".into(),
            recipient: Felt::from_hex_unchecked("0xa"),
            creator: Felt::from_hex_unchecked("0xb"),
            soul_bound: false,
            origin_tag: origin_tag.into(),
            royalty_rate: 10,
            nested_parent_tag: None,
        }
    }

    fn fixture() -> (MemoryCollectionRegistry, DedupStore, EngineConfig) {
        (
            MemoryCollectionRegistry::new(Felt::ONE),
            DedupStore::in_memory().unwrap(),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn accepts_a_well_formed_record() {
        let (registry, store, config) = fixture();
        let outcome = validate_record(&record("0xAAA/1"), &registry, &store, &config).await;
        assert_eq!(outcome, Ok(()));
    }

    #[tokio::test]
    async fn rejects_zero_registry_identity_first() {
        let (_, store, config) = fixture();
        let registry = MemoryCollectionRegistry::new(Felt::ZERO);
        // Even an otherwise-broken record reports the registry problem.
        let mut broken = record("0xAAA/1");
        broken.metadata_uri = String::new();

        let outcome = validate_record(&broken, &registry, &store, &config).await;
        assert_eq!(outcome, Err(ImportError::MissingRegistryIdentity));
    }

    #[tokio::test]
    async fn rejects_malformed_fields_in_order() {
        let (registry, store, config) = fixture();

        let mut no_uri = record("0xAAA/1");
        no_uri.metadata_uri = String::new();
        assert_eq!(
            validate_record(&no_uri, &registry, &store, &config).await,
            Err(ImportError::EmptyMetadataUri)
        );

        let mut no_recipient = record("0xAAA/1");
        no_recipient.recipient = Felt::ZERO;
        assert_eq!(
            validate_record(&no_recipient, &registry, &store, &config).await,
            Err(ImportError::ZeroAddress("recipient"))
        );

        let mut no_creator = record("0xAAA/1");
        no_creator.creator = Felt::ZERO;
        assert_eq!(
            validate_record(&no_creator, &registry, &store, &config).await,
            Err(ImportError::ZeroAddress("creator"))
        );

        let mut greedy = record("0xAAA/1");
        greedy.royalty_rate = 101;
        assert_eq!(
            validate_record(&greedy, &registry, &store, &config).await,
            Err(ImportError::RoyaltyOutOfRange(101))
        );
    }

    #[tokio::test]
    async fn nested_import_requires_an_implementation() {
        let (registry, store, config) = fixture();
        let mut nested = record("0xAAA/2");
        nested.nested_parent_tag = Some("0xAAA/1".into());

        assert_eq!(
            validate_record(&nested, &registry, &store, &config).await,
            Err(ImportError::MissingAccountImplementation)
        );

        let mut with_impl = config.clone();
        with_impl.account_implementation = Some(Felt::from_hex_unchecked("0x111"));
        assert_eq!(
            validate_record(&nested, &registry, &store, &with_impl).await,
            Ok(())
        );
    }

    #[tokio::test]
    async fn rejects_tag_known_to_the_dedup_store() {
        let (registry, store, config) = fixture();
        store.reserve(registry.identity(), "0xAAA/1").unwrap();

        assert_eq!(
            validate_record(&record("0xAAA/1"), &registry, &store, &config).await,
            Err(ImportError::AlreadyImported("0xAAA/1".into()))
        );
    }

    #[tokio::test]
    async fn rejects_tag_already_stored_in_the_registry() {
        // Ground-truth check: the registry was minted into through another
        // path, so the dedup store has never seen the tag.
        let (registry, store, config) = fixture();
        registry
            .mint(&record("0xAAA/1").mint_request(Felt::from_hex_unchecked("0xa")))
            .await
            .unwrap();

        assert_eq!(
            validate_record(&record("0xAAA/1"), &registry, &store, &config).await,
            Err(ImportError::AlreadyImported("0xAAA/1".into()))
        );
    }

    #[tokio::test]
    async fn unreadable_count_degrades_duplicate_check() {
        let (registry, store, config) = fixture();
        registry.fail_total_count(true);

        assert_eq!(
            validate_record(&record("0xAAA/1"), &registry, &store, &config).await,
            Ok(())
        );
    }

    #[tokio::test]
    async fn batch_preflight_reports_per_record() {
        let (registry, store, config) = fixture();
        let mut bad = record("0xAAA/2");
        bad.royalty_rate = 200;

        let outcomes =
            validate_batch(&[record("0xAAA/1"), bad], &registry, &store, &config)
                .await
                .unwrap();
        assert_eq!(outcomes[0], Ok(()));
        assert_eq!(outcomes[1], Err(ImportError::RoyaltyOutOfRange(200)));
    }

    #[tokio::test]
    async fn batch_preflight_enforces_bounds() {
        let (registry, store, config) = fixture();
        assert_eq!(
            validate_batch(&[], &registry, &store, &config).await,
            Err(ImportError::EmptyBatch)
        );

        let records: Vec<_> = (0..config.max_batch_size + 1)
            .map(|i| record(&format!("0xAAA/{i}")))
            .collect();
        assert_eq!(
            validate_batch(&records, &registry, &store, &config).await,
            Err(ImportError::BatchTooLarge {
                len: config.max_batch_size + 1,
                max: config.max_batch_size
            })
        );
    }
}
