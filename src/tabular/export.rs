//! Detail exporters: one row per supplier card, carrying the internal
//! database columns plus the derived reconciliation columns.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::reconciliation::{InternalColumns, ReconciliationRun};
use crate::traits::DetailExporter;
use crate::types::*;

/// Headers of the columns computed by the reconciliation
pub const DERIVED_COLUMNS: [&str; 6] = [
    "CONSTA BASE B2",
    "LISTA DE AQUISIÇÃO RNP",
    "CHIP TESTE",
    "FIDELIDADE LIMITE",
    "APTO A FATURAR",
    "MOTIVO NÃO FATURAMENTO",
];

const IDENTIFIER_HEADER: &str = "ICCID";

/// `dd/mm/yyyy`, empty for missing dates
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "SIM"
    } else {
        "NÃO"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailColumn {
    Identifier,
    Internal(usize),
    Derived(usize),
}

fn detail_columns(columns: &InternalColumns) -> Vec<DetailColumn> {
    let derived = (0..DERIVED_COLUMNS.len()).map(DetailColumn::Derived);
    let mut layout = vec![DetailColumn::Identifier];

    for index in 0..columns.headers.len() {
        if index == columns.identifier {
            continue;
        }
        layout.push(DetailColumn::Internal(index));
        if Some(index) == columns.suspension {
            layout.extend(derived.clone());
        }
    }
    if columns.suspension.is_none() {
        layout.extend(derived);
    }
    layout
}

fn derived_value(record: &SimRecord, index: usize) -> String {
    match index {
        0 => yes_no(record.in_internal_db).to_string(),
        1 => yes_no(record.in_acquisition_list).to_string(),
        2 => yes_no(record.is_test_chip).to_string(),
        3 => format_date(record.loyalty_deadline),
        4 => yes_no(record.billable).to_string(),
        _ => record.reason_label().to_string(),
    }
}

fn internal_value(columns: &InternalColumns, record: &SimRecord, index: usize) -> String {
    if index == columns.status {
        return record.status.label().to_string();
    }
    if Some(index) == columns.activation {
        return format_date(record.activation_date);
    }
    if Some(index) == columns.cancellation {
        return format_date(record.cancellation_date);
    }
    if Some(index) == columns.suspension {
        return format_date(record.suspension_date);
    }
    record.internal_values.get(index).cloned().unwrap_or_default()
}

/// Headers and text rows of the detail table, records in roster order
pub fn detail_table(columns: &InternalColumns, records: &[SimRecord]) -> (Vec<String>, Vec<Vec<String>>) {
    let layout = detail_columns(columns);

    let headers = layout
        .iter()
        .map(|column| match column {
            DetailColumn::Identifier => IDENTIFIER_HEADER.to_string(),
            DetailColumn::Internal(index) => columns.headers[*index].clone(),
            DetailColumn::Derived(index) => DERIVED_COLUMNS[*index].to_string(),
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            layout
                .iter()
                .map(|column| match column {
                    DetailColumn::Identifier => record.iccid.clone(),
                    DetailColumn::Internal(index) => internal_value(columns, record, *index),
                    DetailColumn::Derived(index) => derived_value(record, *index),
                })
                .collect()
        })
        .collect();

    (headers, rows)
}

/// Writes the detail table to an xlsx workbook
#[derive(Debug, Clone)]
pub struct XlsxDetailExporter {
    path: PathBuf,
    sheet_name: String,
}

impl XlsxDetailExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet_name: "Detalhe".to_string(),
        }
    }

    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = name.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, headers: &[String], rows: &[Vec<String>]) -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet().set_name(&self.sheet_name)?;

        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
            let width = header.chars().count().max(12) as f64 + 2.0;
            worksheet.set_column_width(col as u16, width)?;
        }
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(row as u32 + 1, col as u16, value)?;
                }
            }
        }

        if !headers.is_empty() {
            worksheet.autofilter(0, 0, rows.len() as u32, headers.len() as u16 - 1)?;
            worksheet.set_freeze_panes(1, 0)?;
        }
        workbook.save(&self.path)
    }
}

impl DetailExporter for XlsxDetailExporter {
    fn export_detail(&mut self, run: &ReconciliationRun) -> BillingResult<()> {
        let (headers, rows) = detail_table(&run.internal_columns, &run.records);
        self.write(&headers, &rows)
            .map_err(|e| BillingError::Export(format!("{}: {}", self.path.display(), e)))?;
        log::info!("detail: wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

/// Writes the detail table as `;`-delimited CSV
#[derive(Debug)]
pub struct CsvDetailExporter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvDetailExporter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().delimiter(b';').from_writer(inner),
        }
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> BillingResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| BillingError::Export(e.to_string()))
    }
}

impl<W: Write> DetailExporter for CsvDetailExporter<W> {
    fn export_detail(&mut self, run: &ReconciliationRun) -> BillingResult<()> {
        let (headers, rows) = detail_table(&run.internal_columns, &run.records);
        self.writer.write_record(&headers)?;
        for row in &rows {
            self.writer.write_record(row)?;
        }
        self.writer.flush()?;
        log::info!("detail: wrote {} csv rows", rows.len());
        Ok(())
    }
}
