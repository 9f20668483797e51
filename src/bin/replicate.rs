//! Replication Binary
//!
//! Copies the configured datasets for the window (default: yesterday),
//! then prunes where retention is configured.
//!
//! Options: --settings, --log, --from, --to, --only, --list
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    replicator::Cli::parse().run().await
}
