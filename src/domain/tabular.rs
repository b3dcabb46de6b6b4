//! Normalized query output and query inputs
//!
//! A [`TabularResult`] is the only shape of data the pipeline moves around:
//! ordered, uniquely named columns and rows of text cells. Cell values are
//! converted to text when the result is built, so numeric and date typing is
//! gone by the time a report reaches the encoder.

use super::errors::ExportError;
use super::result::Result;
use std::collections::HashSet;

/// Column-ordered table of text cells
///
/// Every row has exactly as many cells as there are columns; the constructor
/// and [`TabularResult::push_row`] reject anything else.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabularResult {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularResult {
    /// Creates an empty result with the given columns
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Invariant` if a column name appears twice.
    pub fn with_columns(columns: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(ExportError::Invariant(format!(
                    "Duplicate column name '{column}' in query result"
                )));
            }
        }

        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Creates a result from columns and rows, checking every row length
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut result = Self::with_columns(columns)?;
        result.rows.reserve(rows.len());
        for row in rows {
            result.push_row(row)?;
        }
        Ok(result)
    }

    /// Appends a row
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Invariant` if the row length differs from the column count.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ExportError::Invariant(format!(
                "Row {} has {} cell(s) but the result has {} column(s)",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in the order the store returned them
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in the order the store returned them
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of a column, matched by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A named query input with an upper bound on its length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    /// Parameter name as it appears in the template, without the `@` sigil
    pub name: String,

    /// Maximum length of `value` in characters
    pub max_length: usize,

    /// Bound value
    pub value: String,
}

impl QueryParameter {
    /// Creates a new query parameter
    pub fn new(name: impl Into<String>, max_length: usize, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_length,
            value: value.into(),
        }
    }

    /// Checks the value against `max_length`
    ///
    /// Oversized values are rejected rather than truncated: a truncated
    /// package id would silently report on a different package.
    pub fn validate(&self) -> Result<()> {
        let length = self.value.chars().count();
        if length > self.max_length {
            return Err(ExportError::Validation(format!(
                "Parameter @{} is {} characters long, maximum is {}",
                self.name, length, self.max_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_accepts_matching_rows() {
        let result = TabularResult::new(
            cols(&["PackageId", "Downloads"]),
            vec![cols(&["Foo", "12"]), cols(&["Bar", "7"])],
        )
        .unwrap();

        assert_eq!(result.row_count(), 2);
        assert_eq!(result.columns(), &["PackageId", "Downloads"]);
        assert_eq!(result.rows()[1], vec!["Bar", "7"]);
    }

    #[test]
    fn test_row_length_mismatch_rejected() {
        let err = TabularResult::new(cols(&["A", "B"]), vec![cols(&["only one"])]).unwrap_err();
        assert!(matches!(err, ExportError::Invariant(_)));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = TabularResult::with_columns(cols(&["A", "A"])).unwrap_err();
        assert!(err.to_string().contains("Duplicate column name 'A'"));
    }

    #[test]
    fn test_zero_columns_allows_empty_rows() {
        let result = TabularResult::new(Vec::new(), vec![Vec::new(), Vec::new()]).unwrap();
        assert_eq!(result.row_count(), 2);
        assert!(result.columns().is_empty());
    }

    #[test]
    fn test_column_lookup_is_exact() {
        let result =
            TabularResult::new(cols(&["PackageId"]), vec![cols(&["Foo"]), cols(&["Bar"])])
                .unwrap();

        assert_eq!(result.column_index("PackageId"), Some(0));
        assert_eq!(result.column_index("packageid"), None);
    }

    #[test]
    fn test_parameter_length_bound() {
        assert!(QueryParameter::new("PackageId", 5, "Foo.B").validate().is_ok());

        let err = QueryParameter::new("PackageId", 5, "Foo.Bar")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ExportError::Validation(_)));
    }

    #[test]
    fn test_parameter_length_counts_characters() {
        // Four characters, eight bytes
        assert!(QueryParameter::new("PackageId", 4, "ÄÖÜß").validate().is_ok());
    }
}
