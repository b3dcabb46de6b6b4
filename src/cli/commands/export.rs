//! Export command implementation
//!
//! Runs the aggregate reports and the per-package reports against the
//! configured warehouse and Blob Storage account.

use super::connect_warehouse;
use crate::adapters::blob::AzureBlobPublisher;
use crate::cli::{
    EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_PARTIAL_FAILURE, EXIT_SUCCESS,
};
use crate::config::load_config;
use crate::core::export::{ExportDispatcher, ExportSettings, ExportSummary};
use clap::Args;
use std::sync::Arc;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Dry run mode - run every query and encode every report, but upload
    /// and confirm nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Only export these package ids (comma-separated, case-insensitive)
    #[arg(long = "package", value_name = "ID[,ID...]")]
    pub packages: Option<String>,

    /// Skip the aggregate reports and go straight to the per-package phase
    #[arg(long)]
    pub skip_aggregates: bool,

    /// Override the number of concurrent per-package workers
    #[arg(long)]
    pub max_workers: Option<usize>,
}

impl ExportArgs {
    /// Package ids given with `--package`
    pub fn package_filter(&self) -> Vec<String> {
        self.packages
            .as_deref()
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Some(max_workers) = self.max_workers {
            tracing::info!(max_workers, "Overriding worker count from CLI");
            config.export.max_workers = max_workers;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let mut settings = ExportSettings::from_config(&config);
        settings.package_filter = self.package_filter();
        settings.skip_aggregates = self.skip_aggregates;

        if settings.dry_run {
            println!("🔍 DRY RUN MODE - no reports will be uploaded, no exports confirmed");
            println!();
        }

        let publisher = match AzureBlobPublisher::new(&config.storage) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create Blob Storage publisher");
                eprintln!("Failed to initialize Blob Storage publisher: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let warehouse = match connect_warehouse(&config.warehouse).await {
            Ok(w) => w,
            Err(code) => return Ok(code),
        };

        let dispatcher = ExportDispatcher::new(settings, Arc::new(warehouse), Arc::new(publisher));

        println!("🚀 Starting export...");
        println!();

        let summary = match dispatcher.run().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export aborted");
                eprintln!("Export aborted: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        print_summary(&summary);

        let exit_code = match summary.ensure_success() {
            Ok(()) => {
                println!("✅ Export completed successfully!");
                EXIT_SUCCESS
            }
            Err(e) => {
                println!("⚠️  {e}");
                println!("   Failed packages stay pending and are retried on the next run.");
                EXIT_PARTIAL_FAILURE
            }
        };

        Ok(exit_code)
    }
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Aggregate Reports: {}", summary.aggregate_reports.join(", "));
    println!("  Packages: {}", summary.total_packages);
    println!("  Successful: {}", summary.successful_packages);
    println!("  Failed: {}", summary.failed_packages);
    println!("  Confirmed: {}", summary.confirmations);
    println!("  Retries: {}", summary.retries);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();

    if !summary.failures.is_empty() {
        println!("⚠️  Failed packages:");
        for (i, failure) in summary.failures.iter().enumerate() {
            if i == 10 {
                println!("  ... and {} more", summary.failures.len() - 10);
                break;
            }
            println!(
                "  - {} ({} attempt(s)): {}",
                failure.package_id, failure.attempts, failure.message
            );
        }
        println!();
    }
}
