//! Normalization and validation utilities

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

use crate::tabular::Cell;
use crate::types::*;

/// Fixed width of a normalized ICCID
pub const ICCID_WIDTH: usize = 19;

/// Largest integer an f64 holds exactly; identifiers stored as numbers
/// beyond it may have lost digits
const F64_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Trim and left-pad an identifier with `0` to [`ICCID_WIDTH`] characters.
/// Longer values are left as they are. Blank input yields `None`.
pub fn normalize_iccid(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("{:0>width$}", trimmed, width = ICCID_WIDTH))
}

/// Normalize the identifier held in a cell
pub fn normalize_iccid_cell(cell: &Cell) -> Option<String> {
    if let Cell::Number(n) = cell {
        if n.abs() > F64_EXACT_INT {
            log::warn!("identifier {} is stored as a number and may have lost digits", n);
        }
    }
    normalize_iccid(&cell.to_text())
}

/// Convert a spreadsheet serial day number (1900 date system) to a date
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

/// Parse a date written as text. Accepts ISO dates, ISO date-times and
/// day-first Brazilian dates.
pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    None
}

/// Read an optional date from a cell. Blank cells are absent; any other
/// cell that is not a date is an input error.
pub fn parse_date_cell(
    cell: &Cell,
    dataset: DatasetKind,
    row: usize,
    column: &str,
) -> BillingResult<Option<NaiveDate>> {
    let parsed = match cell {
        Cell::Empty => return Ok(None),
        Cell::Date(date) => Some(*date),
        Cell::Number(serial) => excel_serial_to_date(*serial),
        Cell::Text(text) => parse_date_text(text),
    };

    parsed.map(Some).ok_or_else(|| BillingError::DateParse {
        dataset,
        row,
        column: column.to_string(),
        value: cell.to_text(),
    })
}

/// Fail on the first identifier that occurs more than once
pub fn validate_unique_identifiers<'a, I>(identifiers: I) -> BillingResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for iccid in identifiers {
        *counts.entry(iccid).or_insert(0) += 1;
    }

    let mut duplicates: Vec<(&str, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort();

    match duplicates.first() {
        Some((iccid, count)) => Err(BillingError::DuplicateIdentifier {
            iccid: iccid.to_string(),
            count: *count,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_pads_and_trims() {
        assert_eq!(
            normalize_iccid("  12345 ").as_deref(),
            Some("0000000000000012345")
        );
        assert_eq!(
            normalize_iccid("8955010000000000001").as_deref(),
            Some("8955010000000000001")
        );
        assert_eq!(
            normalize_iccid("89550100000000000012").as_deref(),
            Some("89550100000000000012")
        );
        assert_eq!(normalize_iccid("   "), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_iccid(" 42").unwrap();
        assert_eq!(normalize_iccid(&once).unwrap(), once);
    }

    #[test]
    fn test_normalize_number_cell() {
        assert_eq!(
            normalize_iccid_cell(&Cell::Number(123.0)).as_deref(),
            Some("0000000000000000123")
        );
        assert_eq!(normalize_iccid_cell(&Cell::Empty), None);
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial_to_date(45747.0), Some(date(2025, 3, 31)));
        assert_eq!(excel_serial_to_date(45747.75), Some(date(2025, 3, 31)));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date_text("2025-04-30"), Some(date(2025, 4, 30)));
        assert_eq!(parse_date_text("30/04/2025"), Some(date(2025, 4, 30)));
        assert_eq!(parse_date_text("2025-04-30 13:45:00"), Some(date(2025, 4, 30)));
        assert_eq!(parse_date_text("30/04/2025 08:00"), Some(date(2025, 4, 30)));
        assert_eq!(parse_date_text("abril"), None);
    }

    #[test]
    fn test_parse_date_cell() {
        let dataset = DatasetKind::InternalDatabase;
        assert_eq!(parse_date_cell(&Cell::Empty, dataset, 1, "D").unwrap(), None);
        assert_eq!(
            parse_date_cell(&Cell::Date(date(2025, 1, 2)), dataset, 1, "D").unwrap(),
            Some(date(2025, 1, 2))
        );

        let err = parse_date_cell(&Cell::text("ontem"), dataset, 7, "DATA DE ATIVAÇÃO").unwrap_err();
        match err {
            BillingError::DateParse { row, column, value, .. } => {
                assert_eq!(row, 7);
                assert_eq!(column, "DATA DE ATIVAÇÃO");
                assert_eq!(value, "ontem");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unique_identifiers() {
        assert!(validate_unique_identifiers(["a", "b", "c"]).is_ok());

        let err = validate_unique_identifiers(["a", "b", "a", "a"]).unwrap_err();
        assert!(matches!(
            err,
            BillingError::DuplicateIdentifier { ref iccid, count: 3 } if iccid == "a"
        ));
    }
}
