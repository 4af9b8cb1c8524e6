//! CSV loader

use crate::tabular::table::{Cell, Table};
use crate::types::*;

/// Pick `;` for files exported by spreadsheet tools with a comma decimal
/// locale, `,` otherwise. Only the header line is inspected; title lines
/// above it often carry no separator at all.
fn sniff_delimiter(data: &str, header_row: usize) -> u8 {
    let header_line = data.lines().nth(header_row).unwrap_or("");
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Parse CSV text into a [`Table`]. The header is the line at `header_row`
/// (0-based); lines before it are discarded.
pub fn read_csv_table(data: &str, header_row: usize) -> BillingResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(data, header_row))
        .from_reader(data.as_bytes());

    let mut records = reader.records();
    for _ in 0..header_row {
        if records.next().transpose()?.is_none() {
            return Ok(Table::default());
        }
    }

    let headers: Vec<String> = match records.next().transpose()? {
        Some(record) => record.iter().map(|h| h.to_string()).collect(),
        None => return Ok(Table::default()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(record.iter().map(Cell::text).collect());
    }

    log::debug!("csv: read {} rows, {} columns", rows.len(), headers.len());
    Ok(Table::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_basic() {
        let csv = "\
Iccid,Plano
8955010000000000001,M2M
 8955010000000000002 ,M2M
";
        let table = read_csv_table(csv, 0).unwrap();
        assert_eq!(table.headers(), &["Iccid".to_string(), "Plano".to_string()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 0).to_text(), " 8955010000000000002 ");
    }

    #[test]
    fn test_header_offset_and_semicolons() {
        let csv = "\
RELATORIO BASE B2;;
ICCID;STATUS;DATA DE ATIVAÇÃO
8955010000000000001;ATIVO;2025-01-10
8955010000000000002;;
";
        let table = read_csv_table(csv, 1).unwrap();
        assert_eq!(table.column_index("status"), Some(1));
        assert_eq!(table.len(), 2);
        assert!(table.cell(1, 1).is_empty());
    }

    #[test]
    fn test_delimiter_taken_from_header_line() {
        let csv = "\
RELATORIO BASE B2, exportado em 01/05/2025
ICCID;STATUS
8955010000000000001;ATIVO
";
        let table = read_csv_table(csv, 1).unwrap();
        assert_eq!(table.headers(), &["ICCID".to_string(), "STATUS".to_string()]);
        assert_eq!(table.column_index("STATUS"), Some(1));
        assert_eq!(table.cell(0, 1).to_text(), "ATIVO");

        let untitled = read_csv_table("RELATORIO BASE B2\nICCID;STATUS\n1;ATIVO\n", 1).unwrap();
        assert_eq!(untitled.column_index("STATUS"), Some(1));
    }

    #[test]
    fn test_empty_input() {
        assert!(read_csv_table("", 0).unwrap().is_empty());
        assert!(read_csv_table("only,header\n", 3).unwrap().headers().is_empty());
    }
}
