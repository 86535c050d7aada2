//! Configuration for the migration rehearsal CLI.

use clap::Parser;

/// Rehearse a token migration batch before running it for real.
///
/// Loads import records from a JSON array and either pre-flight validates
/// them (`--check`) or runs the full batch against a simulated in-memory
/// destination registry. The dedup store can be kept on disk so repeated
/// rehearsals observe earlier admissions.
///
/// # Examples
///
/// ```bash
/// # Pre-flight validation only
/// portico-import --records batch.json --check
///
/// # Full rehearsal with a persistent dedup store
/// portico-import --records batch.json --db ./portico-data/dedup.db
/// ```
#[derive(Parser, Debug)]
#[command(name = "portico-import")]
#[command(about = "Validate and rehearse token migration batches", long_about = None)]
pub struct Config {
    /// Path to a JSON array of import records
    #[arg(long)]
    pub records: String,

    /// Engine configuration file (portico.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Dedup store database path (in-memory when omitted)
    #[arg(long)]
    pub db: Option<String>,

    /// Identity of the simulated destination registry (hex)
    #[arg(long, default_value = "0x1")]
    pub registry: String,

    /// Actor the imports are attributed to (hex)
    #[arg(long, default_value = "0x1")]
    pub actor: String,

    /// Pre-flight validation only, no simulated mints
    #[arg(long)]
    pub check: bool,

    /// Emit results as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
