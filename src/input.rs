//! Reads the recipient spreadsheet into ordered records.
//!
//! The first row is the header. A `Phone` column is required; a `Message`
//! column is optional (header names are matched case-insensitively). Row
//! order is preserved. Fully empty rows are dropped; a row with content but
//! no phone number is kept so the run records it as a failure.

use std::path::Path;

use calamine::{Data, Reader};
use tracing::{debug, warn};

use crate::dispatch::RecipientRecord;
use crate::error::InputError;

/// Header of the identifier column.
pub const PHONE_COLUMN: &str = "Phone";

/// Header of the optional per-recipient message column.
pub const MESSAGE_COLUMN: &str = "Message";

/// Records loaded from one spreadsheet.
#[derive(Debug, Clone)]
pub struct RecipientSheet {
    pub records: Vec<RecipientRecord>,
    /// Whether the sheet had a `Message` column at all.
    pub has_message_column: bool,
}

/// Load recipients from the first worksheet of an xlsx/xls/ods file.
pub fn load_recipients(path: &Path) -> Result<RecipientSheet, InputError> {
    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| InputError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| InputError::NoWorksheet {
            path: path.to_path_buf(),
        })?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| InputError::Open {
            path: path.to_path_buf(),
            reason: format!("sheet '{sheet_name}': {e}"),
        })?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let sheet = parse_rows(&rows)?;
    debug!(
        path = %path.display(),
        sheet = %sheet_name,
        recipients = sheet.records.len(),
        "Loaded recipients"
    );
    Ok(sheet)
}

/// Turn header + data rows into records.
pub fn parse_rows(rows: &[Vec<String>]) -> Result<RecipientSheet, InputError> {
    let Some((header, data)) = rows.split_first() else {
        return Err(InputError::MissingColumn {
            column: PHONE_COLUMN.to_string(),
        });
    };

    let phone_idx = find_column(header, PHONE_COLUMN).ok_or_else(|| InputError::MissingColumn {
        column: PHONE_COLUMN.to_string(),
    })?;
    let message_idx = find_column(header, MESSAGE_COLUMN);

    let mut records = Vec::with_capacity(data.len());
    for (i, row) in data.iter().enumerate() {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let identifier = row.get(phone_idx).map(|s| s.trim()).unwrap_or_default();
        if identifier.is_empty() {
            // +2: one for the header, one for 1-based row numbers.
            warn!(row = i + 2, "Row has no phone number; it will be logged as failed");
        }

        let message = message_idx
            .and_then(|idx| row.get(idx))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        records.push(RecipientRecord::new(identifier, message));
    }

    Ok(RecipientSheet {
        records,
        has_message_column: message_idx.is_some(),
    })
}

fn find_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Cell contents as text. Whole-number floats (phone numbers typed into a
/// numeric cell) lose their trailing `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn parses_phone_and_message_in_order() {
        let sheet = parse_rows(&rows(&[
            &["Phone", "Message"],
            &["201234567890", "Hello 1"],
            &["201098765432", "Hello 2"],
        ]))
        .unwrap();

        assert!(sheet.has_message_column);
        assert_eq!(
            sheet.records,
            vec![
                RecipientRecord::with_message("201234567890", "Hello 1"),
                RecipientRecord::with_message("201098765432", "Hello 2"),
            ]
        );
    }

    #[test]
    fn header_match_is_case_insensitive_and_any_order() {
        let sheet = parse_rows(&rows(&[
            &["Name", " message ", "PHONE"],
            &["Omar", "hi", "201111111111"],
        ]))
        .unwrap();
        assert_eq!(sheet.records[0].identifier, "201111111111");
        assert_eq!(sheet.records[0].message.as_deref(), Some("hi"));
    }

    #[test]
    fn message_column_is_optional() {
        let sheet = parse_rows(&rows(&[&["Phone"], &["201111111111"]])).unwrap();
        assert!(!sheet.has_message_column);
        assert_eq!(sheet.records[0].message, None);
    }

    #[test]
    fn blank_message_becomes_none() {
        let sheet = parse_rows(&rows(&[&["Phone", "Message"], &["201111111111", "  "]])).unwrap();
        assert_eq!(sheet.records[0].message, None);
    }

    #[test]
    fn missing_phone_column_is_an_error() {
        let err = parse_rows(&rows(&[&["Number", "Message"], &["1", "x"]])).unwrap_err();
        assert!(matches!(err, InputError::MissingColumn { ref column } if column == "Phone"));

        let err = parse_rows(&[]).unwrap_err();
        assert!(matches!(err, InputError::MissingColumn { .. }));
    }

    #[test]
    fn skips_empty_rows_but_keeps_rows_without_phone() {
        let sheet = parse_rows(&rows(&[
            &["Phone", "Message"],
            &["", ""],
            &["", "orphan"],
            &["201111111111", "ok"],
            &["201222222222"],
        ]))
        .unwrap();
        assert_eq!(sheet.records.len(), 3);
        assert!(!sheet.records[0].has_identifier());
        assert_eq!(sheet.records[0].message.as_deref(), Some("orphan"));
        assert_eq!(sheet.records[2].identifier, "201222222222");
        assert_eq!(sheet.records[2].message, None);
    }

    #[test]
    fn numeric_phone_cells_render_without_decimal() {
        assert_eq!(cell_text(&Data::Float(201234567890.0)), "201234567890");
        assert_eq!(cell_text(&Data::Int(201234567890)), "201234567890");
        assert_eq!(cell_text(&Data::String(" 2012 ".into())), "2012");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = load_recipients(Path::new("/nonexistent/recipients.xlsx")).unwrap_err();
        assert!(matches!(err, InputError::Open { .. }));
    }
}
