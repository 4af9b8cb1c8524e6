//! Spreadsheet loader (xlsx, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::tabular::table::{Cell, Table};
use crate::types::*;
use crate::utils::excel_serial_to_date;

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        // integers are kept as text so long identifiers survive
        Data::Int(n) => Cell::Text(n.to_string()),
        Data::Float(n) => Cell::Number(*n),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_date(serial)
                .map(Cell::Date)
                .unwrap_or(Cell::Number(serial))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
    }
}

/// Read one sheet of a workbook into a [`Table`].
///
/// `sheet` is matched case-insensitively; `None` selects the first sheet.
/// `header_row` is the 0-based sheet row holding the headers.
pub fn read_workbook_table(
    path: &Path,
    sheet: Option<&str>,
    header_row: usize,
) -> BillingResult<Table> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| BillingError::Read(format!("{}: {}", path.display(), e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| {
                BillingError::Read(format!(
                    "{}: sheet '{}' not found (available: {})",
                    path.display(),
                    wanted,
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names.first().cloned().ok_or_else(|| {
            BillingError::Read(format!("{}: workbook contains no sheets", path.display()))
        })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| BillingError::Read(format!("sheet '{}': {}", sheet_name, e)))?;

    // the range starts at the first used row, not at sheet row 0
    let first_used_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let skip = header_row.saturating_sub(first_used_row);

    let mut rows = range.rows().skip(skip);
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| data_to_cell(c).to_text()).collect(),
        None => return Ok(Table::default()),
    };
    let data: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();

    log::debug!(
        "workbook: {} sheet '{}' read {} rows",
        path.display(),
        sheet_name,
        data.len()
    );
    Ok(Table::new(headers, data))
}
