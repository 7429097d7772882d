use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::CsvError;
use crate::ledger::BudgetLedger;
use crate::model::{BudgetLine, DisbursementOutcome, TransferRecord};

pub const SUMMARY_COLUMNS: [&str; 11] = [
    "Particular",
    "BA CODE",
    "Commitment Code",
    "GL CODE",
    "AMOUNT (Required Budget)",
    "BUDGET SHEET VALUE (Available Budget)",
    "DIFF (Budget - Required)",
    "Diversion From Fund Center",
    "Diversion Amount",
    "Donor Balance After Donation",
    "DIFF AFTER DIVERSION",
];

pub const TRANSFER_COLUMNS: [&str; 8] = [
    "Receiver Fund Center",
    "Donor Fund Center",
    "Comm. Code",
    "Required Amount",
    "Receiver Original Budget",
    "Diverted Amount",
    "Donor Budget Before",
    "Donor Budget After",
];

pub const BUDGET_COLUMNS: [&str; 5] = [
    "Fund Center",
    "Comm. Code",
    "TEXT",
    "Fund CenterComm. Code",
    "Budget Available",
];

// Rows are written positionally under the explicit column lists above.

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    particular: &'a str,
    unit: &'a str,
    category: &'a str,
    gl_code: &'a str,
    required: String,
    available: Option<String>,
    difference: Option<String>,
    diversion_from: Option<String>,
    diverted: Option<String>,
    donor_balances: Option<String>,
    final_difference: Option<String>,
}

#[derive(Debug, Serialize)]
struct TransferRow<'a> {
    receiver: &'a str,
    donor: &'a str,
    category: &'a str,
    required: String,
    receiver_original: String,
    diverted: String,
    donor_before: String,
    donor_after: String,
}

#[derive(Debug, Serialize)]
struct BudgetRow<'a> {
    unit: &'a str,
    category: &'a str,
    text: &'a str,
    key: String,
    available: String,
}

fn writer<W: io::Write>(out: W, columns: &[&str]) -> Result<csv::Writer<W>, CsvError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(columns)?;
    Ok(writer)
}

/// Write the disbursement summary, one row per outcome.
pub fn write_summary<'a, W: io::Write>(
    out: W,
    outcomes: impl IntoIterator<Item = &'a DisbursementOutcome>,
) -> Result<(), CsvError> {
    let mut writer = writer(out, &SUMMARY_COLUMNS)?;

    for outcome in outcomes {
        let request = &outcome.request;
        let allocation = outcome.allocation.as_ref();

        let row = SummaryRow {
            particular: &request.particular,
            unit: &request.unit,
            category: &request.category,
            gl_code: &request.gl_code,
            required: request.amount.to_string(),
            available: allocation.map(|a| a.original.to_string()),
            difference: allocation.map(|a| a.difference.to_string()),
            diversion_from: allocation.map(|a| {
                a.contributions
                    .iter()
                    .map(|c| format!("{} ({})", c.donor, c.amount.grouped()))
                    .collect::<Vec<_>>()
                    .join("; ")
            }),
            diverted: allocation.map(|a| a.diverted.to_string()),
            donor_balances: allocation.map(|a| {
                a.contributions
                    .iter()
                    .map(|c| format!("{} Bal ({})", c.donor, c.balance_after.grouped()))
                    .collect::<Vec<_>>()
                    .join("; ")
            }),
            final_difference: allocation.map(|a| a.final_difference().to_string()),
        };
        writer.serialize(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the transfer ledger. The header is written even when no diversion
/// happened.
pub fn write_transfers<'a, W: io::Write>(
    out: W,
    transfers: impl IntoIterator<Item = &'a TransferRecord>,
) -> Result<(), CsvError> {
    let mut writer = writer(out, &TRANSFER_COLUMNS)?;

    for transfer in transfers {
        writer.serialize(&TransferRow {
            receiver: transfer.receiver.as_str(),
            donor: transfer.donor.as_str(),
            category: transfer.category.as_str(),
            required: transfer.required.to_string(),
            receiver_original: transfer.receiver_original.to_string(),
            diverted: transfer.diverted.to_string(),
            donor_before: transfer.donor_before.to_string(),
            donor_after: transfer.donor_after.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write budget lines as a reference table.
pub fn write_budget<'a, W: io::Write>(
    out: W,
    lines: impl IntoIterator<Item = &'a BudgetLine>,
) -> Result<(), CsvError> {
    let mut writer = writer(out, &BUDGET_COLUMNS)?;

    for line in lines {
        writer.serialize(&BudgetRow {
            unit: line.unit.as_str(),
            category: line.category.as_str(),
            text: &line.description,
            key: format!("{}{}", line.unit, line.category),
            available: line.available.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one `<unit>.csv` budget table per fund center into `dir`.
pub fn write_budget_by_unit(dir: &Path, ledger: &BudgetLedger) -> Result<Vec<PathBuf>, CsvError> {
    let mut written = Vec::new();
    let lines: Vec<&BudgetLine> = ledger.lines().collect();

    // ledger order groups lines of the same unit together
    for group in lines.chunk_by(|a, b| a.unit == b.unit) {
        let path = dir.join(format!("{}.csv", group[0].unit));
        write_budget(File::create(&path)?, group.iter().copied())?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::engine::Engine;
    use crate::model::{CategoryCode, DisbursementRequest, UnitCode};

    fn line(u: &str, c: &str, available: f64) -> BudgetLine {
        BudgetLine {
            unit: UnitCode::parse(u).unwrap(),
            category: CategoryCode::parse(c).unwrap(),
            description: "Salaries".to_string(),
            available: Amount::from_float(available),
        }
    }

    fn request(u: &str, amount: f64) -> DisbursementRequest {
        DisbursementRequest {
            particular: "Pay".to_string(),
            unit: u.to_string(),
            category: "A10001".to_string(),
            gl_code: "5100".to_string(),
            amount: Amount::from_float(amount),
        }
    }

    fn engine() -> Engine {
        let ledger = BudgetLedger::build(vec![
            line("F1001", "A10001", 100.0),
            line("F1002", "A10001", 1200.0),
            line("F1003", "A10001", 50.0),
        ]);
        let mut engine = Engine::new(ledger).unwrap();
        engine.process(request("1001", 1350.0)).unwrap();
        engine.process(request("F1003", 20.0)).unwrap();
        engine.process(request("F7777", 10.0)).unwrap();
        engine
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), CsvError>) -> Vec<String> {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn summary_rows() {
        let engine = engine();
        let lines = render(|buf| write_summary(buf, engine.recorder().outcomes()));

        assert_eq!(lines[0], SUMMARY_COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "Pay,1001,A10001,5100,1350.00,100.00,-1250.00,\"F1002 (1,200.00); F1003 (50.00)\",\
             1250.00,F1002 Bal (0.00); F1003 Bal (0.00),0.00"
        );
        // F1003 was drained above but is measured against its budgeted 50
        assert_eq!(lines[2], "Pay,F1003,A10001,5100,20.00,50.00,30.00,,0.00,,30.00");
        assert_eq!(lines[3], "Pay,F7777,A10001,5100,10.00,,,,,,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn transfer_rows() {
        let engine = engine();
        let lines = render(|buf| write_transfers(buf, engine.recorder().transfers()));

        assert_eq!(lines[0], TRANSFER_COLUMNS.join(","));
        assert_eq!(lines[1], "F1001,F1002,A10001,1350.00,100.00,1200.00,1200.00,0.00");
        assert_eq!(lines[2], "F1001,F1003,A10001,1350.00,100.00,50.00,50.00,0.00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_transfer_table_keeps_header() {
        let lines = render(|buf| write_transfers(buf, &[] as &[TransferRecord]));
        assert_eq!(lines, vec![TRANSFER_COLUMNS.join(",")]);
    }

    #[test]
    fn budget_rows() {
        let ledger = BudgetLedger::build(vec![line("G2001", "B20002", 1234.5)]);
        let lines = render(|buf| write_budget(buf, ledger.lines()));

        assert_eq!(lines[0], BUDGET_COLUMNS.join(","));
        assert_eq!(lines[1], "G2001,B20002,Salaries,G2001B20002,1234.50");
    }

    #[test]
    fn budget_split_by_unit() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = BudgetLedger::build(vec![
            line("F1001", "A10001", 1.0),
            line("F1001", "B20002", 2.0),
            line("G2001", "A10001", 3.0),
        ]);

        let written = write_budget_by_unit(dir.path(), &ledger).unwrap();
        assert_eq!(written.len(), 2);

        let f1001 = std::fs::read_to_string(dir.path().join("F1001.csv")).unwrap();
        assert_eq!(f1001.lines().count(), 3);
        let g2001 = std::fs::read_to_string(dir.path().join("G2001.csv")).unwrap();
        assert_eq!(g2001.lines().count(), 2);
    }
}
