//! Origin lookup: locate a token in the destination registry by its
//! stored origin tag.

use anyhow::{Context, Result};
use starknet::core::utils::starknet_keccak;

use portico_core::CollectionRegistry;

/// Find the lowest registry index whose stored origin tag matches `tag`.
///
/// Scans indices `1..=total_count` in ascending order and compares tags by
/// content hash. Indices that fail to read (absent or burned tokens) are
/// skipped. Cost is linear in the registry size; the registry exposes no
/// index of its own.
///
/// An unreadable total count is an `Err`: duplicate-check callers map it
/// to "not found", parent resolution treats it as a hard failure.
pub async fn find_by_origin_tag(
    registry: &dyn CollectionRegistry,
    tag: &str,
) -> Result<Option<u64>> {
    let total = registry
        .total_count()
        .await
        .context("reading destination registry total count")?;
    let target = starknet_keccak(tag.as_bytes());

    for index in 1..=total {
        match registry.origin_tag(index).await {
            Ok(stored) => {
                if starknet_keccak(stored.as_bytes()) == target {
                    return Ok(Some(index));
                }
            }
            Err(error) => {
                tracing::trace!(
                    target: "portico::lookup",
                    index,
                    error = %error,
                    "skipping unreadable token"
                );
            }
        }
    }

    Ok(None)
}
