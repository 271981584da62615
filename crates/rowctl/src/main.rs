use std::fs::File;
use std::io::{self, BufWriter};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use index_cursor::{RetryBudget, ViewerRow};
use solr_index::SolrFetcher;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

mod args;
mod export;

use args::{Cli, Cmd};
use export::{count_rows, export_rows};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let index = Arc::new(SolrFetcher::<ViewerRow>::new(cli.solr_config())?);
    let cfg = index.config();
    tracing::info!(
        solr = %cfg.base_url,
        unique_key = %cfg.unique_key,
        timeout_ms = cfg.request_timeout_ms,
        "using index"
    );
    let cancel = cancel_on_ctrl_c();

    match cli.cmd {
        Cmd::Export { query, budget, out } => {
            let query = query.to_query()?;
            let budget = budget.resolve(RetryBudget::from_env());

            let summary = match out {
                Some(path) => {
                    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
                    export_rows(index, query, budget, cancel, &mut BufWriter::new(file)).await?
                }
                None => {
                    let stdout = io::stdout();
                    export_rows(index, query, budget, cancel, &mut stdout.lock()).await?
                }
            };

            if let Some(err) = summary.failure {
                bail!("export stopped after {} of {} rows: {err}", summary.written, summary.total);
            }
            tracing::info!(rows = summary.written, "done");
        }
        Cmd::Count { query, budget } => {
            let query = query.to_query()?;
            let budget = budget.resolve(RetryBudget::from_env());
            let total = count_rows(index, query, budget, cancel).await?;
            println!("{total}");
        }
    }
    Ok(())
}

/// Logs go to stderr; stdout carries exported rows.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let ct = CancellationToken::new();
    let child = ct.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping before the next page");
            child.cancel();
        }
    });
    ct
}
