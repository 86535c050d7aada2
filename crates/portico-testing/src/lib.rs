//! In-memory collaborator fakes for exercising the migration engine.
//!
//! Both fakes support failure injection so tests can drive the engine
//! through registry rejections and unreadable state without a live
//! destination.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use starknet::core::types::Felt;

use portico_core::{AccountParams, AccountRegistry, CollectionRegistry, MintRequest};

/// Vec-backed append-only destination registry.
///
/// Token indices run `1..=len`. Mint rejections, unreadable indices, and
/// total-count failures can be injected per test.
pub struct MemoryCollectionRegistry {
    identity: Felt,
    tokens: Mutex<Vec<MintRequest>>,
    reject_mints: Mutex<Option<String>>,
    unreadable: Mutex<HashSet<u64>>,
    fail_total_count: AtomicBool,
}

impl MemoryCollectionRegistry {
    pub fn new(identity: Felt) -> Self {
        Self {
            identity,
            tokens: Mutex::new(Vec::new()),
            reject_mints: Mutex::new(None),
            unreadable: Mutex::new(HashSet::new()),
            fail_total_count: AtomicBool::new(false),
        }
    }

    /// Reject every mint from now on with the given reason.
    pub fn reject_mints(&self, reason: impl Into<String>) {
        *self.reject_mints.lock().unwrap() = Some(reason.into());
    }

    /// Accept mints again after [`Self::reject_mints`].
    pub fn accept_mints(&self) {
        *self.reject_mints.lock().unwrap() = None;
    }

    /// Make reads of `index` fail, as for a burned token.
    pub fn mark_unreadable(&self, index: u64) {
        self.unreadable.lock().unwrap().insert(index);
    }

    /// Make `total_count` fail until called with `false`.
    pub fn fail_total_count(&self, fail: bool) {
        self.fail_total_count.store(fail, Ordering::SeqCst);
    }

    /// The mint request stored at `index`, if any.
    pub fn token(&self, index: u64) -> Option<MintRequest> {
        let tokens = self.tokens.lock().unwrap();
        index
            .checked_sub(1)
            .and_then(|i| tokens.get(i as usize).cloned())
    }

    pub fn minted_count(&self) -> u64 {
        self.tokens.lock().unwrap().len() as u64
    }
}

#[async_trait]
impl CollectionRegistry for MemoryCollectionRegistry {
    fn identity(&self) -> Felt {
        self.identity
    }

    async fn mint(&self, request: &MintRequest) -> Result<u64> {
        if let Some(reason) = self.reject_mints.lock().unwrap().clone() {
            bail!("{reason}");
        }
        let mut tokens = self.tokens.lock().unwrap();
        tokens.push(request.clone());
        Ok(tokens.len() as u64)
    }

    async fn origin_tag(&self, index: u64) -> Result<String> {
        if self.unreadable.lock().unwrap().contains(&index) {
            bail!("token {index} is not readable");
        }
        let tokens = self.tokens.lock().unwrap();
        match index.checked_sub(1).and_then(|i| tokens.get(i as usize)) {
            Some(token) => Ok(token.origin_tag.clone()),
            None => bail!("token {index} does not exist"),
        }
    }

    async fn total_count(&self) -> Result<u64> {
        if self.fail_total_count.load(Ordering::SeqCst) {
            bail!("total count unavailable");
        }
        Ok(self.tokens.lock().unwrap().len() as u64)
    }
}

/// Account registry that tracks which addresses were materialized.
///
/// Materializing an existing address is a no-op; the mutation counter
/// lets tests assert idempotency.
#[derive(Default)]
pub struct MemoryAccountRegistry {
    created: Mutex<HashSet<Felt>>,
    mutations: AtomicU64,
}

impl MemoryAccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialize calls that actually created an account.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn contains(&self, address: Felt) -> bool {
        self.created.lock().unwrap().contains(&address)
    }
}

#[async_trait]
impl AccountRegistry for MemoryAccountRegistry {
    async fn materialize(&self, params: &AccountParams) -> Result<Felt> {
        let address = params.address();
        if self.created.lock().unwrap().insert(address) {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(address)
    }
}
