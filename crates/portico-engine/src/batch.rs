//! Batch orchestration over the single-record importer.

use starknet::core::types::Felt;

use portico_core::{ImportError, ImportRecord, ImportResult};

use crate::importer::ImportEngine;

impl ImportEngine {
    /// Import a batch of records on behalf of `actor`.
    ///
    /// The batch shape is checked before any record is touched; after
    /// that, records run in input order with per-item isolation: a failed
    /// record never prevents the remaining ones from being attempted, and
    /// exactly one result per record comes back, in order. Failed items
    /// are not retried; resubmitting them is the caller's concern.
    pub async fn import_batch(
        &self,
        records: &[ImportRecord],
        actor: Felt,
    ) -> Result<Vec<ImportResult>, ImportError> {
        if records.is_empty() {
            return Err(ImportError::EmptyBatch);
        }
        let max = self.config.max_batch_size;
        if records.len() > max {
            return Err(ImportError::BatchTooLarge {
                len: records.len(),
                max,
            });
        }

        tracing::info!(
            target: "portico::batch",
            records = records.len(),
            actor = %format!("{actor:#x}"),
            "batch started"
        );

        let mut results = Vec::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            let result = self.import_one(record, actor).await;
            tracing::debug!(
                target: "portico::batch",
                position,
                origin = %record.origin_tag,
                success = result.success,
                "record processed"
            );
            results.push(result);
        }

        let succeeded = results.iter().filter(|result| result.success).count();
        tracing::info!(
            target: "portico::batch",
            records = results.len(),
            succeeded,
            failed = results.len() - succeeded,
            "batch completed"
        );
        Ok(results)
    }
}
