//! Export dispatcher - orchestrates a full report run
//!
//! A run has two phases. The aggregate reports are produced one after the
//! other, so all of them are published before any per-package report. The
//! per-package phase then takes a single snapshot of the packages to export
//! and fans it out over a bounded worker pool. Each unit of work queries,
//! encodes, publishes and (for dirty-list candidates) confirms one package,
//! and is retried as a whole. A failed package never stops its siblings;
//! failures are collected in the [`ExportSummary`].

use crate::adapters::blob::{ArtifactPublisher, JSON_CONTENT_TYPE};
use crate::adapters::warehouse::{QueryTemplate, Warehouse};
use crate::config::{PerPackageSource, PopstatsConfig};
use crate::core::export::candidates::{
    apply_package_filter, list_candidates, packages_from_aggregate, PACKAGE_ID_COLUMN,
};
use crate::core::export::retry::{RetryExecutor, RetryPolicy};
use crate::core::export::summary::{ExportSummary, PackageFailure};
use crate::core::report::{package_blob_name, AggregateReport, JsonEncoder, DEFAULT_CONTAINER};
use crate::domain::{
    ExportCandidate, ExportError, PackageExport, QueryParameter, Result, ResultExt, TabularResult,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Settings of one export run
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Container reports are published to
    pub container: String,
    /// Per-package units of work in flight at once
    pub max_workers: usize,
    /// Retry policy for every unit of work
    pub retry: RetryPolicy,
    /// Where the per-package work list comes from
    pub per_package_source: PerPackageSource,
    /// Maximum length of the bound package id parameter
    pub package_id_max_length: usize,
    /// Query and encode, but neither upload nor confirm
    pub dry_run: bool,
    /// Restrict the per-package phase to these ids (case-insensitive)
    pub package_filter: Vec<String>,
    /// Go straight to the per-package phase
    pub skip_aggregates: bool,
}

impl ExportSettings {
    /// Settings from loaded configuration
    pub fn from_config(config: &PopstatsConfig) -> Self {
        Self {
            container: config.storage.container.clone(),
            max_workers: config.export.max_workers,
            retry: RetryPolicy::from_config(&config.export),
            per_package_source: config.export.per_package_source,
            package_id_max_length: config.export.package_id_max_length,
            dry_run: config.application.dry_run,
            package_filter: Vec::new(),
            skip_aggregates: false,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            max_workers: 4,
            retry: RetryPolicy::default(),
            per_package_source: PerPackageSource::Dirty,
            package_id_max_length: 128,
            dry_run: false,
            package_filter: Vec::new(),
            skip_aggregates: false,
        }
    }
}

/// An aggregate report produced during the run
#[derive(Debug, Clone)]
pub struct AggregateOutput {
    /// Which report
    pub report: AggregateReport,
    /// Query result the report was encoded from
    pub result: TabularResult,
}

/// Export dispatcher
pub struct ExportDispatcher {
    settings: ExportSettings,
    warehouse: Arc<dyn Warehouse>,
    publisher: Arc<dyn ArtifactPublisher>,
    retry: RetryExecutor,
    encoder: JsonEncoder,
}

impl ExportDispatcher {
    /// Create a dispatcher over the given warehouse and publisher
    pub fn new(
        settings: ExportSettings,
        warehouse: Arc<dyn Warehouse>,
        publisher: Arc<dyn ArtifactPublisher>,
    ) -> Self {
        let retry = RetryExecutor::new(settings.retry, warehouse.clone());
        Self {
            settings,
            warehouse,
            publisher,
            retry,
            encoder: JsonEncoder::new(),
        }
    }

    /// Execute a full run: aggregate reports, then per-package reports
    ///
    /// `Err` means the run stopped early: an aggregate report, the candidate
    /// listing or an invariant check failed. An `Ok` summary may still hold
    /// per-package failures; call [`ExportSummary::ensure_success`] on it, or
    /// use [`run_checked`](Self::run_checked), before treating the run as
    /// successful.
    pub async fn run(&self) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new(self.settings.dry_run);

        if self.settings.skip_aggregates
            && self.settings.per_package_source == PerPackageSource::RecentPopularity
        {
            return Err(ExportError::Configuration(
                "Aggregate reports cannot be skipped when per-package reports are taken \
                 from the recent popularity report"
                    .to_string(),
            ));
        }

        tracing::info!(
            container = %self.settings.container,
            source = ?self.settings.per_package_source,
            max_workers = self.settings.max_workers,
            max_attempts = self.settings.retry.max_attempts(),
            dry_run = self.settings.dry_run,
            "Starting export run"
        );

        let aggregates = if self.settings.skip_aggregates {
            tracing::info!("Skipping aggregate reports");
            Vec::new()
        } else {
            self.run_aggregate_reports(&mut summary).await?
        };

        self.run_bulk_export(&aggregates, &mut summary).await?;

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();

        Ok(summary)
    }

    /// Like [`run`](Self::run), but a run with failed packages is an error
    ///
    /// Failed packages surface as `ExportError::BulkExportFailed`; the
    /// individual failures are logged by the run itself.
    pub async fn run_checked(&self) -> Result<ExportSummary> {
        let summary = self.run().await?;
        summary.ensure_success()?;
        Ok(summary)
    }

    /// Produce the aggregate reports in their fixed sequence
    ///
    /// Stops at the first report that cannot be published.
    pub async fn run_aggregate_reports(
        &self,
        summary: &mut ExportSummary,
    ) -> Result<Vec<AggregateOutput>> {
        let mut outputs = Vec::with_capacity(AggregateReport::SEQUENCE.len());

        for report in AggregateReport::SEQUENCE {
            let operation = format!("aggregate report {}", report);
            let attempted = self
                .retry
                .run_counted(&operation, move || self.produce_aggregate(report))
                .await;
            let attempts = attempted.attempts;
            let result = attempted
                .result
                .with_context(|| format!("Aggregate report {}", report))?;

            summary.record_aggregate(report.blob_name(), attempts);
            outputs.push(AggregateOutput {
                report,
                result,
            });
        }

        Ok(outputs)
    }

    /// Export one report per package, bounded by `max_workers`
    ///
    /// Every unit runs to completion (or retry exhaustion) even when others
    /// fail. Failures are recorded in `summary`.
    pub async fn run_bulk_export(
        &self,
        aggregates: &[AggregateOutput],
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let exports = self.package_exports(aggregates).await?;
        let exports = apply_package_filter(exports, &self.settings.package_filter);
        let total = exports.len();
        summary.total_packages = total;

        if exports.is_empty() {
            tracing::info!("No packages pending export");
            return Ok(());
        }

        tracing::info!(
            total = total,
            max_workers = self.settings.max_workers,
            "Starting per-package export"
        );

        let mut outcomes = stream::iter(exports.iter())
            .map(move |export| async move {
                let operation = format!("package {}", export.package_id());
                let attempted = self
                    .retry
                    .run_counted(&operation, move || self.export_package(export))
                    .await;
                (export, attempted)
            })
            .buffer_unordered(self.settings.max_workers.max(1));

        let mut completed = 0usize;
        while let Some((export, attempted)) = outcomes.next().await {
            completed += 1;
            match attempted.result {
                Ok(confirmed) => {
                    summary.record_package_success(attempted.attempts, confirmed);
                    crate::log_package_progress!(export.package_id(), completed, total, true);
                }
                Err(e) => {
                    summary.record_package_failure(PackageFailure::new(
                        export.package_id().clone(),
                        attempted.attempts,
                        &e,
                    ));
                    crate::log_package_progress!(export.package_id(), completed, total, false);
                }
            }
        }

        Ok(())
    }

    /// Snapshot of packages with unexported changes
    pub async fn list_candidates(&self) -> Result<Vec<ExportCandidate>> {
        list_candidates(&self.retry, self.warehouse.as_ref()).await
    }

    async fn package_exports(&self, aggregates: &[AggregateOutput]) -> Result<Vec<PackageExport>> {
        match self.settings.per_package_source {
            PerPackageSource::Dirty => Ok(self
                .list_candidates()
                .await?
                .into_iter()
                .map(PackageExport::Confirmed)
                .collect()),
            PerPackageSource::RecentPopularity => {
                let output = aggregates
                    .iter()
                    .find(|o| o.report == AggregateReport::RecentPopularity)
                    .ok_or_else(|| {
                        ExportError::Configuration(
                            "Recent popularity report was not produced in this run".to_string(),
                        )
                    })?;
                packages_from_aggregate(&output.result)
            }
        }
    }

    async fn produce_aggregate(
        &self,
        report: AggregateReport,
    ) -> Result<TabularResult> {
        let result = {
            let session = self.warehouse.open_session().await?;
            session.execute(report.template(), &[]).await?
        };
        self.publish(report.blob_name(), &result).await?;
        Ok(result)
    }

    /// One attempt at one package; returns whether the export was confirmed
    async fn export_package(&self, export: &PackageExport) -> Result<bool> {
        let package_id = export.package_id();
        let parameters = [QueryParameter::new(
            PACKAGE_ID_COLUMN,
            self.settings.package_id_max_length,
            package_id.as_str(),
        )];

        let session = self.warehouse.open_session().await?;
        let result = session
            .execute(QueryTemplate::RecentPopularityByPackage, &parameters)
            .await?;

        let uri = self.publish(&package_blob_name(package_id), &result).await?;

        match (export.confirmation(), uri) {
            (Some(candidate), Some(_)) => {
                session
                    .confirm_export(candidate.package_id(), candidate.dirty_count())
                    .await?;
                tracing::debug!(
                    package_id = %candidate.package_id(),
                    dirty_count = candidate.dirty_count(),
                    "Export confirmed"
                );
                Ok(true)
            }
            (Some(candidate), None) => {
                tracing::info!(
                    package_id = %candidate.package_id(),
                    dirty_count = candidate.dirty_count(),
                    "Dry run: confirmation skipped"
                );
                Ok(false)
            }
            (None, _) => Ok(false),
        }
    }

    async fn publish(&self, blob_name: &str, result: &TabularResult) -> Result<Option<Url>> {
        let content = self.encoder.encode(result)?;
        let rows = result.row_count();
        let bytes = content.len();

        if self.settings.dry_run {
            crate::log_report_published!(blob_name, rows, bytes, true);
            return Ok(None);
        }

        let uri = self
            .publisher
            .publish(&self.settings.container, blob_name, JSON_CONTENT_TYPE, content)
            .await?;
        crate::log_report_published!(uri, rows, bytes, false);
        Ok(Some(uri))
    }
}
