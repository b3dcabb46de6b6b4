//! Report catalogue and blob naming
//!
//! Blob names are a pure function of what the report describes. Aggregate
//! reports have fixed names; per-package reports embed the lower-cased
//! package id, which is the naming convention readers of the container use.

use crate::adapters::warehouse::QueryTemplate;
use crate::domain::PackageId;
use std::fmt;

/// Container reports are published to unless configured otherwise
pub const DEFAULT_CONTAINER: &str = "popularity";

/// Prefix of every per-package report blob
pub const PACKAGE_REPORT_PREFIX: &str = "recentpopularity_";

/// Blob name of the per-package report for `package_id`
pub fn package_blob_name(package_id: &PackageId) -> String {
    format!("{}{}.json", PACKAGE_REPORT_PREFIX, package_id.to_lowercase())
}

/// Whole-dataset reports produced before the per-package phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateReport {
    /// Downloads per calendar month
    PerMonth,
    /// Most popular package versions
    RecentPopularityDetail,
    /// Most popular packages
    RecentPopularity,
}

impl AggregateReport {
    /// Aggregate reports in the order they are published
    pub const SEQUENCE: [AggregateReport; 3] = [
        AggregateReport::PerMonth,
        AggregateReport::RecentPopularityDetail,
        AggregateReport::RecentPopularity,
    ];

    /// Query producing the report
    pub fn template(self) -> QueryTemplate {
        match self {
            AggregateReport::PerMonth => QueryTemplate::PerMonth,
            AggregateReport::RecentPopularityDetail => QueryTemplate::RecentPopularityDetail,
            AggregateReport::RecentPopularity => QueryTemplate::RecentPopularity,
        }
    }

    /// Fixed blob name of the report
    pub fn blob_name(self) -> &'static str {
        match self {
            AggregateReport::PerMonth => "permonth.json",
            AggregateReport::RecentPopularityDetail => "recentpopularitydetail.json",
            AggregateReport::RecentPopularity => "recentpopularity.json",
        }
    }
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.blob_name())
    }
}
