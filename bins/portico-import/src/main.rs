//! Portico Import - migration batch rehearsal tool
//!
//! Runs a batch of import records through the real migration engine with
//! a simulated destination registry, so operators can see exactly which
//! records would be admitted, rejected, or deduplicated before spending
//! anything on the live path.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use starknet::core::types::Felt;

use config::Config;
use portico_core::{ImportRecord, ImportResult};
use portico_engine::{DedupStore, EngineConfig, ImportEngine};
use portico_testing::{MemoryAccountRegistry, MemoryCollectionRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    let config = Config::parse();
    run(config).await
}

async fn run(cli: Config) -> Result<()> {
    let raw = std::fs::read_to_string(&cli.records)
        .with_context(|| format!("reading records from {}", cli.records))?;
    let records: Vec<ImportRecord> =
        serde_json::from_str(&raw).context("records file must be a JSON array of records")?;

    let engine_config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading engine config from {path}"))?,
        None => EngineConfig::default(),
    };

    let registry_identity =
        Felt::from_hex(&cli.registry).context("--registry must be a hex address")?;
    let actor = Felt::from_hex(&cli.actor).context("--actor must be a hex address")?;

    let store = match &cli.db {
        Some(path) => DedupStore::open(path)?,
        None => DedupStore::in_memory()?,
    };

    let engine = ImportEngine::new(
        Arc::new(MemoryCollectionRegistry::new(registry_identity)),
        Arc::new(MemoryAccountRegistry::new()),
        store,
        engine_config,
        actor,
    );

    tracing::info!(
        target: "portico::cli",
        records = records.len(),
        check_only = cli.check,
        "starting rehearsal"
    );

    let results: Vec<ImportResult> = if cli.check {
        let outcomes = engine.validate_batch(&records).await?;
        records
            .iter()
            .zip(outcomes)
            .map(|(record, outcome)| match outcome {
                Ok(()) => ImportResult {
                    origin_tag: record.origin_tag.clone(),
                    token_index: None,
                    success: true,
                    reason: None,
                },
                Err(error) => ImportResult::rejected(&record.origin_tag, &error),
            })
            .collect()
    } else {
        engine.import_batch(&records, actor).await?
    };

    let failed = results.iter().filter(|result| !result.success).count();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for (position, result) in results.iter().enumerate() {
            let status = if result.success { "ok" } else { "FAIL" };
            let detail = match (&result.token_index, &result.reason) {
                (Some(index), _) => format!("token #{index}"),
                (None, Some(reason)) => reason.clone(),
                (None, None) => String::new(),
            };
            println!("{position:>4}  {status:<4}  {}  {detail}", result.origin_tag);
        }
        println!(
            "\n{} records, {} ok, {} failed",
            results.len(),
            results.len() - failed,
            failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
