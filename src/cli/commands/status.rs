//! Status command implementation
//!
//! Lists the packages waiting for a per-package report, without exporting.

use super::connect_warehouse;
use crate::cli::{EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::export::candidates::list_candidates;
use crate::core::export::{RetryExecutor, RetryPolicy};
use crate::domain::ExportCandidate;
use clap::Args;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of packages to list, by descending dirty count
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        println!("📊 Export Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let warehouse = match connect_warehouse(&config.warehouse).await {
            Ok(w) => Arc::new(w),
            Err(code) => return Ok(code),
        };

        let retry = RetryExecutor::new(RetryPolicy::from_config(&config.export), warehouse.clone());
        let candidates = match list_candidates(&retry, warehouse.as_ref()).await {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to list export candidates");
                println!("   Error: {}", e);
                return Ok(EXIT_FATAL);
            }
        };

        if candidates.is_empty() {
            println!("No packages pending export.");
            return Ok(EXIT_SUCCESS);
        }

        let pending = top_candidates(candidates, self.top);
        println!(
            "{} package(s) pending export, {} unexported change(s) in total",
            pending.total, pending.dirty_total
        );
        println!();
        println!("{:<60} {:>12}", "Package ID", "Dirty Count");
        println!("{}", "-".repeat(73));
        for candidate in &pending.top {
            println!(
                "{:<60} {:>12}",
                candidate.package_id().as_str(),
                candidate.dirty_count()
            );
        }
        if pending.total > pending.top.len() {
            println!("... and {} more", pending.total - pending.top.len());
        }
        println!();

        Ok(EXIT_SUCCESS)
    }
}

struct PendingOverview {
    total: usize,
    dirty_total: i64,
    top: Vec<ExportCandidate>,
}

fn top_candidates(mut candidates: Vec<ExportCandidate>, top: usize) -> PendingOverview {
    let total = candidates.len();
    let dirty_total = candidates.iter().map(|c| i64::from(c.dirty_count())).sum();

    candidates.sort_by(|a, b| {
        b.dirty_count()
            .cmp(&a.dirty_count())
            .then_with(|| a.package_id().as_str().cmp(b.package_id().as_str()))
    });
    candidates.truncate(top);

    PendingOverview {
        total,
        dirty_total,
        top: candidates,
    }
}
