//! Print zram compression statistics and active swap usage.
//!
//! Usage:
//!   zramstats
//!   zramstats --verbose
//!   zramstats --json

use std::io;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zramstats::Mode;

#[derive(Debug, Parser)]
#[command(name = "zramstats", version)]
#[command(about = "Show zram compression statistics and swap usage")]
struct Cli {
    /// Describe each statistic after the table
    #[arg(short, long)]
    verbose: bool,

    /// Print the statistics as JSON and skip the swap listing
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.json {
            Mode::Json
        } else if self.verbose {
            Mode::Verbose
        } else {
            Mode::Text
        }
    }
}

/// Logs go to stderr so stdout only carries the report. `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mode = cli.mode();
    tracing::debug!(?mode, "collecting zram statistics");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    zramstats::report(mode, &mut out).context("failed to report zram statistics")?;
    out.flush().context("failed to flush stdout")?;
    Ok(())
}
