//! Migration engine admitting external ownership records into a
//! destination collection registry.
//!
//! The engine validates each record, derives the destination recipient for
//! nested-ownership imports, guarantees at-most-once admission per origin
//! tag, and processes batches with per-item failure isolation. The
//! destination collection and the nested-ownership account registry are
//! external collaborators behind the traits in `portico-core`.

mod account;
mod admin;
mod batch;
mod config;
mod importer;
mod lookup;
mod store;
mod validate;

pub use account::resolve_or_create;
pub use config::{EngineConfig, DEFAULT_MAX_BATCH_SIZE};
pub use importer::ImportEngine;
pub use lookup::find_by_origin_tag;
pub use store::DedupStore;
pub use validate::{validate_batch, validate_record};
