//! The row source: spreadsheet rows delivered as positional [`RawRow`]s.

mod client;
mod normalizer;
mod parser;

pub use client::SheetsClient;

use crate::workflows::dashboard::{ColumnLayout, LayoutMismatch, RawRow};
use serde::Serialize;
use std::future::Future;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RowSourceError {
    #[error("failed to fetch rows: {0}")]
    Fetch(String),
    #[error("unexpected row payload: {0}")]
    Format(String),
    #[error("failed to read sheet export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid sheet CSV data: {0}")]
    Csv(#[from] csv::Error),
}

impl RowSourceError {
    /// Whether the rows arrived but were not shaped as a task table.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Csv(_))
    }
}

impl From<LayoutMismatch> for RowSourceError {
    fn from(value: LayoutMismatch) -> Self {
        Self::Format(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Everything one fetch of one sheet returned.
#[derive(Debug, Clone, Default)]
pub struct SheetPayload {
    pub headers: Vec<ColumnMeta>,
    pub rows: Vec<RawRow>,
}

impl SheetPayload {
    /// Header check for payloads read with `layout`; see [`ColumnLayout::validate`].
    pub fn validate_layout(&self, layout: &ColumnLayout) -> Result<(), RowSourceError> {
        layout.validate(&self.headers).map_err(|err| {
            tracing::warn!(
                required = err.required,
                found = err.found,
                "sheet headers do not cover the task layout"
            );
            RowSourceError::from(err)
        })
    }
}

/// External tabular data provider queried once per fetch cycle.
pub trait RowSource: Send + Sync {
    fn fetch_rows(
        &self,
        sheet: &str,
    ) -> impl Future<Output = Result<SheetPayload, RowSourceError>> + Send;
}

/// Reads CSV sheet exports.
pub struct SheetImporter;

impl SheetImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<SheetPayload, RowSourceError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<SheetPayload, RowSourceError> {
        let payload = parser::parse_csv(reader)?;
        tracing::debug!(rows = payload.rows.len(), "imported sheet export");
        Ok(payload)
    }
}

/// Roster rows whose marker column holds anything after trimming.
pub fn count_active_staff(rows: &[RawRow]) -> usize {
    rows.iter()
        .filter(|row| !row.cell(ColumnLayout::ROSTER_MARKER).is_blank())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::dashboard::CellValue;
    use std::io::Cursor;

    #[test]
    fn roster_counts_non_blank_marker_cells() {
        let row = |cells: &[&str]| {
            cells
                .iter()
                .map(|cell| CellValue::from(*cell))
                .collect::<RawRow>()
        };
        let rows = vec![
            row(&["1", "a", "Amy"]),
            row(&["2", "b", "   "]),
            row(&["3", "c"]),
            RawRow::new(vec![CellValue::Empty, CellValue::Empty, CellValue::Number(7.0)]),
        ];
        assert_eq!(count_active_staff(&rows), 2);
    }

    #[test]
    fn narrow_header_lists_fail_layout_validation() {
        let payload = SheetImporter::from_reader(Cursor::new("A,B,C\n1,2,3\n")).expect("csv");
        let err = payload
            .validate_layout(&ColumnLayout::STANDARD)
            .expect_err("three columns are not enough");
        assert!(err.is_format());
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        match SheetImporter::from_path("./does-not-exist.csv") {
            Err(RowSourceError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
