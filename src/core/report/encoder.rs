//! JSON encoding of tabular results
//!
//! A [`TabularResult`] is written as a JSON array with one object per row.
//! Object keys are the column names in column order and every value is a
//! string. Rows are serialized straight into the writer, so no intermediate
//! `serde_json::Value` tree is built.

use crate::domain::{Result, TabularResult};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::io::Write;

/// Serializes query results into report artifacts
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEncoder;

impl JsonEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self
    }

    /// Encode a result into a byte buffer
    pub fn encode(&self, result: &TabularResult) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(estimated_size(result));
        self.encode_to(result, &mut buffer)?;
        Ok(buffer)
    }

    /// Encode a result into any writer
    pub fn encode_to<W: Write>(&self, result: &TabularResult, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &Rows(result))?;
        Ok(())
    }
}

fn estimated_size(result: &TabularResult) -> usize {
    let header: usize = result.columns().iter().map(|c| c.len() + 4).sum();
    result.row_count() * (header + result.columns().len() * 8) + 2
}

struct Rows<'a>(&'a TabularResult);

impl Serialize for Rows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let columns = self.0.columns();
        let mut seq = serializer.serialize_seq(Some(self.0.row_count()))?;
        for cells in self.0.rows() {
            seq.serialize_element(&RowObject { columns, cells })?;
        }
        seq.end()
    }
}

struct RowObject<'a> {
    columns: &'a [String],
    cells: &'a [String],
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}
