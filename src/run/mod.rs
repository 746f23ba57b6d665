//! Batch execution of a check document.
//!
//! Checks run in a bounded worker pool: a semaphore caps the number of
//! spawned check tasks in flight, and each task carries its own processing
//! timeout so a stuck host only costs its own check. Reports come back in
//! document order regardless of completion order.

mod finalize;
mod init;
mod task;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{info, warn};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::cache::CachingFetcher;
use crate::checks::{AssertionKind, CheckReport};
use crate::config::{load_checks, CheckDocument, Config};
use crate::error_handling::{ErrorType, ProcessingStats};
use crate::initialization::crypto_provider;
use crate::tls::CertificateFetcher;
use crate::validation::ChainValidator;
use crate::whois::{WhoisClient, WhoisLookup};

pub use finalize::RunSummary;
pub use init::{init_fetcher, init_trust_store, init_validator, RunOptions};
pub use task::CheckTask;

/// Every assertion passed or was skipped.
pub const EXIT_SUCCESS: i32 = 0;
/// At least one assertion failed and none errored.
pub const EXIT_CHECK_FAILED: i32 = 1;
/// At least one check could not be evaluated.
pub const EXIT_CHECK_ERRORED: i32 = 2;
/// The run was aborted before any check executed.
pub const EXIT_CONFIG_ERROR: i32 = 3;

/// Shared, read-only state for the check tasks of one run.
pub struct CheckContext<F, W> {
    pub fetcher: F,
    pub whois: W,
    pub validator: ChainValidator,
    pub options: RunOptions,
    pub stats: ProcessingStats,
}

impl<F, W> CheckContext<F, W> {
    pub fn new(fetcher: F, whois: W, validator: ChainValidator, options: RunOptions) -> Self {
        Self {
            fetcher,
            whois,
            validator,
            options,
            stats: ProcessingStats::new(),
        }
    }
}

/// Results of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// One report per configured check, in document order
    pub checks: Vec<CheckReport>,
    pub summary: RunSummary,
    pub elapsed_seconds: f64,
    /// Non-zero infrastructure error counters
    #[serde(skip)]
    pub infrastructure_errors: Vec<(ErrorType, usize)>,
}

impl RunReport {
    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.summary.errored > 0 {
            EXIT_CHECK_ERRORED
        } else if self.summary.failed > 0 {
            EXIT_CHECK_FAILED
        } else {
            EXIT_SUCCESS
        }
    }
}

/// Runs every check of `document`, certificate checks first.
pub async fn run_checks<F, W>(document: &CheckDocument, ctx: Arc<CheckContext<F, W>>) -> RunReport
where
    F: CertificateFetcher + 'static,
    W: WhoisLookup + 'static,
{
    let started = Instant::now();
    let tasks: Vec<CheckTask> = document
        .certificates()
        .iter()
        .cloned()
        .map(CheckTask::Certificate)
        .chain(document.domains().iter().cloned().map(CheckTask::Domain))
        .collect();
    info!(
        "Running {} check(s) with concurrency {}",
        tasks.len(),
        ctx.options.max_concurrency
    );

    let semaphore = Arc::new(Semaphore::new(ctx.options.max_concurrency.max(1)));
    let mut slots: Vec<Option<CheckReport>> = vec![None; tasks.len()];
    let mut running = FuturesUnordered::new();

    for (index, task) in tasks.into_iter().enumerate() {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Semaphore closed, not running check {}", task.target());
                continue;
            }
        };
        let kind = task.kind();
        let target = task.target().to_string();
        let ctx = Arc::clone(&ctx);
        let handle = tokio::spawn(async move {
            let _permit = permit;
            task::process_check_task(task, ctx).await
        });
        running.push(async move { (index, kind, target, handle.await) });
    }

    while let Some((index, kind, target, joined)) = running.next().await {
        let report = match joined {
            Ok(report) => report,
            Err(e) => {
                warn!("Check task for {target} did not complete: {e}");
                CheckReport::errored(kind, target, AssertionKind::Processing, e.to_string())
            }
        };
        slots[index] = Some(report);
    }

    finalize::finalize_run(slots, &ctx.stats, started)
}

/// Runs the checks named by `config` end to end.
///
/// Every error returned here happened before any check ran (unreadable
/// config, missing CA bundle) and maps to `EXIT_CONFIG_ERROR`.
pub async fn run_with_config(config: &Config) -> Result<RunReport> {
    let document = load_checks(&config.config_file).context("Failed to load check document")?;
    let provider = crypto_provider();
    let validator = init_validator(config, Arc::clone(&provider))?;
    let fetcher = init_fetcher(config, provider)?;
    let options = RunOptions::from_config(config);
    let whois = WhoisClient::new();

    let report = if config.no_cache {
        let ctx = CheckContext::new(fetcher, whois, validator, options);
        run_checks(&document, Arc::new(ctx)).await
    } else {
        let ctx = CheckContext::new(CachingFetcher::new(fetcher), whois, validator, options);
        run_checks(&document, Arc::new(ctx)).await
    };
    Ok(report)
}
