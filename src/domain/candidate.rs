//! Export candidates
//!
//! An [`ExportCandidate`] is a snapshot of one package's outstanding export
//! work taken when the candidate list is read. The dirty count travels with the
//! candidate unchanged until it is handed back to the store on confirmation, so
//! the store only clears the writes that were actually exported.

use super::ids::PackageId;
use serde::{Deserialize, Serialize};

/// One unit of outstanding per-package export work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportCandidate {
    package_id: PackageId,
    dirty_count: i32,
}

impl ExportCandidate {
    /// Creates a candidate from a listing row
    pub fn new(package_id: PackageId, dirty_count: i32) -> Self {
        Self {
            package_id,
            dirty_count,
        }
    }

    /// Package this candidate exports
    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    /// Dirty count observed at listing time
    pub fn dirty_count(&self) -> i32 {
        self.dirty_count
    }
}

/// Per-package unit of work handed to the worker pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageExport {
    /// Dirty-list candidate: publish, then confirm with the snapshot count
    Confirmed(ExportCandidate),
    /// Package taken from an aggregate report: publish only
    Unconfirmed(PackageId),
}

impl PackageExport {
    /// Package the unit exports
    pub fn package_id(&self) -> &PackageId {
        match self {
            PackageExport::Confirmed(candidate) => candidate.package_id(),
            PackageExport::Unconfirmed(package_id) => package_id,
        }
    }

    /// Candidate to confirm once the report is published, if any
    pub fn confirmation(&self) -> Option<&ExportCandidate> {
        match self {
            PackageExport::Confirmed(candidate) => Some(candidate),
            PackageExport::Unconfirmed(_) => None,
        }
    }
}
