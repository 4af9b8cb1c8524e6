//! Table source backed by files on disk

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::DatasetLayout;
use crate::tabular::csv_source::read_csv_table;
use crate::tabular::table::Table;
use crate::tabular::workbook_source::read_workbook_table;
use crate::traits::TableSource;
use crate::types::*;

/// Maps each dataset to a file. CSV and TXT files go through the CSV loader,
/// anything else is opened as a workbook.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    paths: BTreeMap<DatasetKind, PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FileSource::set`]
    pub fn with(mut self, kind: DatasetKind, path: impl Into<PathBuf>) -> Self {
        self.set(kind, path);
        self
    }

    pub fn set(&mut self, kind: DatasetKind, path: impl Into<PathBuf>) {
        self.paths.insert(kind, path.into());
    }

    pub fn path(&self, kind: DatasetKind) -> Option<&Path> {
        self.paths.get(&kind).map(PathBuf::as_path)
    }
}

fn is_delimited_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

impl TableSource for FileSource {
    fn is_supplied(&self, kind: DatasetKind) -> bool {
        self.paths.contains_key(&kind)
    }

    fn load_table(&self, kind: DatasetKind, layout: &DatasetLayout) -> BillingResult<Option<Table>> {
        let Some(path) = self.path(kind) else {
            return Ok(None);
        };
        log::info!("{}: loading {}", kind, path.display());

        let table = if is_delimited_text(path) {
            let data = std::fs::read_to_string(path)
                .map_err(|e| BillingError::Read(format!("{}: {}", path.display(), e)))?;
            read_csv_table(&data, layout.header_row)?
        } else {
            read_workbook_table(path, layout.sheet.as_deref(), layout.header_row)?
        };

        if table.is_empty() {
            log::warn!("{}: {} has no data rows", kind, path.display());
        }
        Ok(Some(table))
    }
}
