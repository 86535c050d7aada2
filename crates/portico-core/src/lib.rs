//! Shared types and collaborator traits for the Portico migration engine.

mod error;
mod record;
mod registry;

pub use starknet::core::types::Felt as FieldElement;

pub use error::ImportError;
pub use record::{
    AccountParams, ActorStats, ImportRecord, ImportResult, MintRequest, MAX_ROYALTY_RATE,
};
pub use registry::{AccountRegistry, CollectionRegistry};
