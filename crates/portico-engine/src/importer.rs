//! Single-record importer.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use starknet::core::types::Felt;

use portico_core::{
    AccountParams, AccountRegistry, ActorStats, CollectionRegistry, ImportError, ImportRecord,
    ImportResult,
};

use crate::{account, config::EngineConfig, lookup, store::DedupStore, validate};

/// Migration engine over one destination collection.
///
/// Holds the dedup store explicitly; nothing here is ambient or static,
/// so callers (and tests) can run isolated engines side by side.
pub struct ImportEngine {
    pub(crate) collection: Arc<dyn CollectionRegistry>,
    pub(crate) accounts: Arc<dyn AccountRegistry>,
    pub(crate) store: DedupStore,
    pub(crate) config: EngineConfig,
    pub(crate) authority: Mutex<Felt>,
    pub(crate) held_balance: Mutex<u128>,
}

impl ImportEngine {
    pub fn new(
        collection: Arc<dyn CollectionRegistry>,
        accounts: Arc<dyn AccountRegistry>,
        store: DedupStore,
        config: EngineConfig,
        authority: Felt,
    ) -> Self {
        Self {
            collection,
            accounts,
            store,
            config,
            authority: Mutex::new(authority),
            held_balance: Mutex::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether `origin_tag` was admitted into the destination collection.
    pub fn is_admitted(&self, origin_tag: &str) -> Result<bool, ImportError> {
        self.store
            .is_admitted(self.collection.identity(), origin_tag)
            .map_err(|error| ImportError::Store(error.to_string()))
    }

    /// Import counters for `actor`.
    pub fn stats_for(&self, actor: Felt) -> Result<ActorStats, ImportError> {
        self.store
            .stats_for(actor)
            .map_err(|error| ImportError::Store(error.to_string()))
    }

    /// Pre-flight validation of a single record. No side effects.
    pub async fn validate(&self, record: &ImportRecord) -> Result<(), ImportError> {
        validate::validate_record(record, self.collection.as_ref(), &self.store, &self.config)
            .await
    }

    /// Pre-flight validation of a whole batch. No side effects.
    pub async fn validate_batch(
        &self,
        records: &[ImportRecord],
    ) -> Result<Vec<Result<(), ImportError>>, ImportError> {
        validate::validate_batch(records, self.collection.as_ref(), &self.store, &self.config)
            .await
    }

    /// Import one record on behalf of `actor`.
    ///
    /// Every failure is converted into a failed [`ImportResult`]; the
    /// record either mints and is admitted permanently, or leaves no
    /// admission behind. Malformed input is not charged against the
    /// actor's failure counter; admission-level failures are.
    pub async fn import_one(&self, record: &ImportRecord, actor: Felt) -> ImportResult {
        match self.try_import(record, actor).await {
            Ok(token_index) => {
                tracing::info!(
                    target: "portico::engine",
                    origin = %record.origin_tag,
                    token_index,
                    "record imported"
                );
                ImportResult::admitted(&record.origin_tag, token_index)
            }
            Err(error) => {
                if !error.is_invalid_input() {
                    if let Err(stats_error) = self.store.record_failure(actor) {
                        tracing::error!(
                            target: "portico::engine",
                            error = %stats_error,
                            "failed to record import failure"
                        );
                    }
                }
                tracing::warn!(
                    target: "portico::engine",
                    origin = %record.origin_tag,
                    error = %error,
                    "record rejected"
                );
                ImportResult::rejected(&record.origin_tag, &error)
            }
        }
    }

    async fn try_import(&self, record: &ImportRecord, actor: Felt) -> Result<u64, ImportError> {
        self.validate(record).await?;

        let recipient = match &record.nested_parent_tag {
            Some(parent_tag) => self.resolve_nested_recipient(parent_tag).await?,
            None => record.recipient,
        };

        let registry = self.collection.identity();
        // Atomic insert-if-absent: the loser of a concurrent race on the
        // same tag stops here, before anything is minted.
        let reserved = self
            .store
            .reserve(registry, &record.origin_tag)
            .map_err(|error| ImportError::Store(error.to_string()))?;
        if !reserved {
            return Err(ImportError::AlreadyImported(record.origin_tag.clone()));
        }

        let request = record.mint_request(recipient);
        match self.collection.mint(&request).await {
            Ok(token_index) => {
                self.store
                    .finalize(
                        registry,
                        &record.origin_tag,
                        token_index,
                        actor,
                        Utc::now().timestamp(),
                    )
                    .map_err(|error| ImportError::Store(error.to_string()))?;
                Ok(token_index)
            }
            Err(error) => {
                if let Err(release_error) = self.store.release(registry, &record.origin_tag) {
                    tracing::error!(
                        target: "portico::engine",
                        origin = %record.origin_tag,
                        error = %release_error,
                        "failed to release reservation after rejected mint"
                    );
                }
                Err(ImportError::DestinationRejected(error.to_string()))
            }
        }
    }

    /// Resolve the nested-ownership account that receives the import in
    /// place of the record's literal recipient.
    ///
    /// Parents admitted through this engine are found in the dedup store's
    /// auxiliary index without touching the registry; anything else falls
    /// back to the linear registry scan.
    async fn resolve_nested_recipient(&self, parent_tag: &str) -> Result<Felt, ImportError> {
        let registry = self.collection.identity();
        let indexed = self
            .store
            .admitted_index(registry, parent_tag)
            .map_err(|error| ImportError::Store(error.to_string()))?;
        let parent_index = match indexed {
            Some(index) => index,
            None => match lookup::find_by_origin_tag(self.collection.as_ref(), parent_tag).await {
                Ok(Some(index)) => index,
                Ok(None) => return Err(ImportError::ParentNotFound(parent_tag.to_string())),
                // The parent must be locatable; an unreadable registry is a
                // hard failure here, unlike in the duplicate check.
                Err(error) => return Err(ImportError::RegistryUnavailable(error.to_string())),
            },
        };

        let implementation = self
            .config
            .account_implementation
            .ok_or(ImportError::MissingAccountImplementation)?;
        let params = AccountParams {
            implementation,
            chain_id: self.config.chain_id,
            token_contract: registry,
            token_index: parent_index,
            salt: self.config.account_salt,
        };

        account::resolve_or_create(self.accounts.as_ref(), &params)
            .await
            .map_err(|error| ImportError::RegistryUnavailable(error.to_string()))
    }
}
