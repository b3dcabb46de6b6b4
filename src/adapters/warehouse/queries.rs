//! Query templates
//!
//! Templates are compiled into the binary from the `queries/` directory and can
//! be replaced one by one with `<query_dir>/<key>.sql` files. Every template
//! references its inputs as `@Name` placeholders, which [`bind_named`]
//! rewrites into PostgreSQL's positional `$n` form.

use crate::domain::{ExportError, QueryParameter, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Every query the exporter runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryTemplate {
    /// Downloads per month
    PerMonth,
    /// Most downloaded package versions over the recent window
    RecentPopularityDetail,
    /// Most downloaded packages over the recent window
    RecentPopularity,
    /// Recent downloads of one package, by version and client
    RecentPopularityByPackage,
    /// Packages with unexported changes and their dirty counts
    ListExportCandidates,
    /// Clears a package's dirty count if it still matches the exported snapshot
    ConfirmExport,
}

impl QueryTemplate {
    /// All templates, in no particular order
    pub const ALL: [QueryTemplate; 6] = [
        QueryTemplate::PerMonth,
        QueryTemplate::RecentPopularityDetail,
        QueryTemplate::RecentPopularity,
        QueryTemplate::RecentPopularityByPackage,
        QueryTemplate::ListExportCandidates,
        QueryTemplate::ConfirmExport,
    ];

    /// Template key, also the override file stem
    pub fn key(&self) -> &'static str {
        match self {
            QueryTemplate::PerMonth => "permonth",
            QueryTemplate::RecentPopularityDetail => "recentpopularitydetail",
            QueryTemplate::RecentPopularity => "recentpopularity",
            QueryTemplate::RecentPopularityByPackage => "recentpopularitybypackage",
            QueryTemplate::ListExportCandidates => "listexportcandidates",
            QueryTemplate::ConfirmExport => "confirmexport",
        }
    }

    fn builtin_sql(&self) -> &'static str {
        match self {
            QueryTemplate::PerMonth => include_str!("../../../queries/permonth.sql"),
            QueryTemplate::RecentPopularityDetail => {
                include_str!("../../../queries/recentpopularitydetail.sql")
            }
            QueryTemplate::RecentPopularity => {
                include_str!("../../../queries/recentpopularity.sql")
            }
            QueryTemplate::RecentPopularityByPackage => {
                include_str!("../../../queries/recentpopularitybypackage.sql")
            }
            QueryTemplate::ListExportCandidates => {
                include_str!("../../../queries/listexportcandidates.sql")
            }
            QueryTemplate::ConfirmExport => include_str!("../../../queries/confirmexport.sql"),
        }
    }
}

impl fmt::Display for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Template text lookup with per-key overrides
#[derive(Debug, Clone, Default)]
pub struct QueryTemplates {
    overrides: HashMap<QueryTemplate, String>,
}

impl QueryTemplates {
    /// Built-in templates only
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Built-in templates, replaced by any `<key>.sql` file found in `dir`
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Configuration` if `dir` is not a directory or an
    /// override file cannot be read.
    pub fn with_override_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ExportError::Configuration(format!(
                "Query template directory not found: {}",
                dir.display()
            )));
        }

        let mut overrides = HashMap::new();
        for template in QueryTemplate::ALL {
            let path = dir.join(format!("{}.sql", template.key()));
            if !path.exists() {
                continue;
            }
            let sql = std::fs::read_to_string(&path).map_err(|e| {
                ExportError::Configuration(format!(
                    "Failed to read query template {}: {}",
                    path.display(),
                    e
                ))
            })?;
            tracing::info!(template = %template, path = %path.display(), "Using query template override");
            overrides.insert(template, sql);
        }

        Ok(Self { overrides })
    }

    /// True when `template` comes from the override directory
    pub fn is_overridden(&self, template: QueryTemplate) -> bool {
        self.overrides.contains_key(&template)
    }

    /// SQL text for a template
    pub fn sql(&self, template: QueryTemplate) -> &str {
        self.overrides
            .get(&template)
            .map(String::as_str)
            .unwrap_or_else(|| template.builtin_sql())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid")
    })
}

/// Rewrites `@Name` placeholders into `$n`, where n is the parameter's position
///
/// # Errors
///
/// Returns `ExportError::Validation` if the template references a parameter
/// that was not supplied, or a supplied parameter is never referenced.
pub fn bind_named(sql: &str, parameters: &[QueryParameter]) -> Result<String> {
    let mut unknown = Vec::new();
    let mut used = vec![false; parameters.len()];

    let rewritten = placeholder_pattern().replace_all(sql, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match parameters.iter().position(|p| p.name == name) {
            Some(index) => {
                used[index] = true;
                format!("${}", index + 1)
            }
            None => {
                unknown.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !unknown.is_empty() {
        return Err(ExportError::Validation(format!(
            "Query references parameter(s) with no value: @{}",
            unknown.join(", @")
        )));
    }

    let unused: Vec<&str> = parameters
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(p, _)| p.name.as_str())
        .collect();
    if !unused.is_empty() {
        return Err(ExportError::Validation(format!(
            "Parameter(s) not referenced by the query: @{}",
            unused.join(", @")
        )));
    }

    Ok(rewritten.into_owned())
}
