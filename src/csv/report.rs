//! Reader for the raw, sectioned budget report.
//!
//! The report has no csv header row. Column 1 carries the "particulars" text,
//! where star markers delimit fund center sections:
//!
//! ```text
//! *** BSNL ...          closes the current section
//! ** F1234 ...          names a fund center, section stays closed
//! * F1234 ...           names a fund center and opens its section
//! A12345 description    budget line of the open section
//! ```
//!
//! The balance column is the one headed `Available Budge` within the first
//! rows (the last such header wins), or the last column when none exists.

use std::path::Path;

use tracing::debug;

use super::CsvError;
use crate::Amount;
use crate::model::{BudgetLine, CategoryCode, UnitCode};

const PARTICULARS_COLUMN: usize = 1;
const HEADER_SCAN_ROWS: usize = 30;
const AVAILABLE_HEADER: &str = "available budge";

/// Read budget lines out of a sectioned budget report.
pub fn read_budget_report(path: impl AsRef<Path>) -> Result<Vec<BudgetLine>, CsvError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    // cells that are not valid utf-8 are decoded lossily rather than
    // failing the whole report
    let rows = reader
        .byte_records()
        .enumerate()
        .map(|(idx, result)| {
            result
                .map(csv::StringRecord::from_byte_record_lossy)
                .map_err(|source| CsvError::Parse {
                    line: idx + 1,
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(parse_rows(&rows))
}

fn available_column(rows: &[csv::StringRecord]) -> usize {
    let width = rows.iter().map(csv::StringRecord::len).max().unwrap_or(0);
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .filter_map(|row| {
            row.iter()
                .position(|cell| cell.trim().eq_ignore_ascii_case(AVAILABLE_HEADER))
        })
        .last()
        .unwrap_or(width.saturating_sub(1))
}

fn parse_rows(rows: &[csv::StringRecord]) -> Vec<BudgetLine> {
    let available_col = available_column(rows);
    let mut current: Option<UnitCode> = None;
    let mut in_section = false;
    let mut lines = Vec::new();

    for row in rows {
        let Some(text) = row.get(PARTICULARS_COLUMN).map(str::trim) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }

        if is_section_break(text) {
            current = None;
            in_section = false;
            continue;
        }

        if let Some(rest) = text.strip_prefix("**") {
            if let Some(unit) = leading_unit(rest) {
                current = Some(unit);
                in_section = false;
            }
            continue;
        }

        if let Some(rest) = text.strip_prefix('*') {
            if let Some(unit) = leading_unit(rest) {
                current = Some(unit);
                in_section = true;
            }
            continue;
        }

        let Some(unit) = current.as_ref().filter(|_| in_section) else {
            continue;
        };
        if let Some((category, description)) = split_item(text) {
            let cell = row.get(available_col).unwrap_or_default();
            debug!(unit = %unit, category = %category, cell, "budget item");
            lines.push(BudgetLine {
                unit: unit.clone(),
                category,
                description: description.to_string(),
                available: Amount::coerce(cell),
            });
        }
    }

    lines
}

/// `*** BSNL` banner, case-insensitive, as a whole word.
fn is_section_break(text: &str) -> bool {
    let Some(rest) = text.strip_prefix("***") else {
        return false;
    };
    let rest = rest.trim_start();
    rest.get(..4)
        .is_some_and(|word| word.eq_ignore_ascii_case("bsnl"))
        && !rest[4..].starts_with(is_word_char)
}

/// Fund center code at the start of `rest`, followed by a word boundary.
fn leading_unit(rest: &str) -> Option<UnitCode> {
    let rest = rest.trim_start();
    let code = rest.get(..5)?;
    if rest[5..].starts_with(is_word_char) {
        return None;
    }
    UnitCode::parse(code)
}

/// `A12345 description` into its commitment code and description.
fn split_item(text: &str) -> Option<(CategoryCode, &str)> {
    let code = text.get(..6)?;
    let rest = &text[6..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let description = rest.trim();
    if description.is_empty() {
        return None;
    }
    Some((CategoryCode::parse(code)?, description))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn summary(lines: &[BudgetLine]) -> Vec<(String, String, String, Amount)> {
        lines
            .iter()
            .map(|l| entry(l.unit.as_str(), l.category.as_str(), &l.description, l.available))
            .collect()
    }

    fn entry(
        unit: &str,
        category: &str,
        text: &str,
        available: Amount,
    ) -> (String, String, String, Amount) {
        (unit.to_string(), category.to_string(), text.to_string(), available)
    }

    const REPORT: &str = "\
,Particulars,Allotted,Available Budge
,*** BSNL Kerala Circle,,
,** F1001 Trivandrum SSA,,
,A10001 Should be skipped,100,100
,* F1001 Trivandrum Admin,,
,A10001 Salaries and wages,\"1,000\",\"1,000.50\"
,B20002 Medical,50,25
,random note,,
,* G2001 Circle Office,,
,A10001 Salaries and wages,500,400
,*** BSNL Totals,,
,A10001 Outside any section,9,9
";

    #[test]
    fn reads_sectioned_report() {
        let file = write_csv(REPORT);
        let lines = read_budget_report(file.path()).unwrap();

        assert_eq!(
            summary(&lines),
            vec![
                entry("F1001", "A10001", "Salaries and wages", Amount::from_float(1000.5)),
                entry("F1001", "B20002", "Medical", Amount::from_float(25.0)),
                entry("G2001", "A10001", "Salaries and wages", Amount::from_float(400.0)),
            ]
        );
    }

    #[test]
    fn last_column_used_without_header() {
        let file = write_csv(",* F1001 Admin,,\n,A10001 Salaries,7,42\n");
        let lines = read_budget_report(file.path()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].available, Amount::from_float(42.0));
    }

    #[test]
    fn later_available_header_wins() {
        let file = write_csv(
            ",Particulars,Available Budge,\n\
             ,Particulars,Allotted,Available Budge\n\
             ,* F1001 Admin,,\n\
             ,A10001 Salaries,7,42\n",
        );
        let lines = read_budget_report(file.path()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].available, Amount::from_float(42.0));
    }

    #[test]
    fn undecodable_row_does_not_fail_the_report() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b",* F1001 Admin,,\n\
              ,note \xff\xfe here,,\n\
              ,A10001 Salaries,7,42\n\
              ,B20002 Medical \xe9,1,5\n",
        )
        .unwrap();

        let lines = read_budget_report(file.path()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].category.as_str(), "A10001");
        assert_eq!(lines[0].available, Amount::from_float(42.0));
        assert_eq!(lines[1].description, "Medical \u{fffd}");
        assert_eq!(lines[1].available, Amount::from_float(5.0));
    }

    #[test]
    fn double_star_header_closes_open_section() {
        let file = write_csv(
            ",* F1001 Admin,5\n,A10001 Kept,5\n,** F1002 Other,\n,A10001 Dropped,5\n",
        );
        let lines = read_budget_report(file.path()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description, "Kept");
    }

    #[test]
    fn markers() {
        assert!(is_section_break("*** BSNL"));
        assert!(is_section_break("***bsnl kerala"));
        assert!(!is_section_break("*** BSNLX"));
        assert!(!is_section_break("** BSNL"));

        assert_eq!(leading_unit(" F1001 Admin").unwrap().as_str(), "F1001");
        assert!(leading_unit("F10012").is_none());
        assert!(leading_unit("X1001").is_none());

        let (category, text) = split_item("A10001   Pay  ").unwrap();
        assert_eq!(category.as_str(), "A10001");
        assert_eq!(text, "Pay");
        assert!(split_item("A10001").is_none());
        assert!(split_item("A10001X Pay").is_none());
    }
}
