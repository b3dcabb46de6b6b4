//! Per-package work lists
//!
//! Turns query results into the snapshot of [`PackageExport`] units the
//! worker pool consumes. Columns are located by exact name; a missing column
//! means the query and the code disagree, which no retry can fix.

use crate::adapters::warehouse::{QueryTemplate, Warehouse};
use crate::core::export::retry::RetryExecutor;
use crate::domain::{
    ExportCandidate, ExportError, PackageExport, PackageId, Result, TabularResult,
};
use std::collections::HashSet;

/// Column holding the package id in listing and aggregate results
pub const PACKAGE_ID_COLUMN: &str = "PackageId";

/// Column holding the dirty count in the candidate listing
pub const DIRTY_COUNT_COLUMN: &str = "DirtyCount";

fn require_column(result: &TabularResult, name: &str, source: &str) -> Result<usize> {
    result.column_index(name).ok_or_else(|| {
        ExportError::Invariant(format!(
            "{source} result has no '{name}' column (columns: {})",
            result.columns().join(", ")
        ))
    })
}

/// Snapshot of packages with unexported changes
///
/// The listing query is retried like any other unit of work; a result
/// without the expected columns fails immediately.
pub async fn list_candidates(
    retry: &RetryExecutor,
    warehouse: &dyn Warehouse,
) -> Result<Vec<ExportCandidate>> {
    let candidates = retry
        .run_with_retry("list export candidates", move || async move {
            let session = warehouse.open_session().await?;
            let result = session
                .execute(QueryTemplate::ListExportCandidates, &[])
                .await?;
            candidates_from_listing(&result)
        })
        .await?;

    tracing::info!(count = candidates.len(), "Listed export candidates");
    Ok(candidates)
}

/// Candidates from the export candidate listing
pub fn candidates_from_listing(result: &TabularResult) -> Result<Vec<ExportCandidate>> {
    let id_index = require_column(result, PACKAGE_ID_COLUMN, "Candidate listing")?;
    let count_index = require_column(result, DIRTY_COUNT_COLUMN, "Candidate listing")?;

    result
        .rows()
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let package_id = PackageId::new(cells[id_index].as_str()).map_err(|e| {
                ExportError::Invariant(format!("Candidate listing row {row}: {e}"))
            })?;
            let dirty_count = cells[count_index].trim().parse::<i32>().map_err(|_| {
                ExportError::Invariant(format!(
                    "Candidate listing row {row}: dirty count '{}' is not an integer",
                    cells[count_index]
                ))
            })?;
            Ok(ExportCandidate::new(package_id, dirty_count))
        })
        .collect()
}

/// Distinct packages of an aggregate report, in first-seen order
///
/// Ids differing only by case share a blob name, so they are exported once.
pub fn packages_from_aggregate(result: &TabularResult) -> Result<Vec<PackageExport>> {
    let id_index = require_column(result, PACKAGE_ID_COLUMN, "Recent popularity")?;

    let mut seen = HashSet::new();
    let mut exports = Vec::new();
    for cells in result.rows() {
        let Ok(package_id) = PackageId::new(cells[id_index].as_str()) else {
            tracing::warn!("Skipping blank package id in recent popularity report");
            continue;
        };
        if seen.insert(package_id.to_lowercase()) {
            exports.push(PackageExport::Unconfirmed(package_id));
        }
    }
    Ok(exports)
}

/// Keep only the units whose package id matches one of `filter`, ignoring case
pub fn apply_package_filter(exports: Vec<PackageExport>, filter: &[String]) -> Vec<PackageExport> {
    if filter.is_empty() {
        return exports;
    }

    for wanted in filter {
        if !exports.iter().any(|e| e.package_id().eq_ignore_case(wanted)) {
            tracing::warn!(package_id = %wanted, "Requested package is not pending export");
        }
    }

    exports
        .into_iter()
        .filter(|e| filter.iter().any(|wanted| e.package_id().eq_ignore_case(wanted)))
        .collect()
}
