use std::path::Path;

use serde::Deserialize;

use super::CsvError;
use crate::Amount;
use crate::model::{BudgetLine, CategoryCode, UnitCode};

#[derive(Debug, Deserialize)]
struct BudgetRow {
    #[serde(rename = "Fund Center")]
    unit: String,
    #[serde(rename = "Comm. Code")]
    category: String,
    #[serde(rename = "TEXT", default)]
    text: String,
    #[serde(rename = "Budget Available", default)]
    available: String,
}

/// Read budget lines from a flat csv table
/// (`Fund Center,Comm. Code,TEXT,Budget Available`).
pub fn read_budget_lines(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<BudgetLine, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<BudgetRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;

            let unit = UnitCode::parse(&row.unit).ok_or_else(|| CsvError::InvalidCode {
                line,
                field: "fund center",
                value: row.unit.clone(),
            })?;
            let category =
                CategoryCode::parse(&row.category).ok_or_else(|| CsvError::InvalidCode {
                    line,
                    field: "commitment code",
                    value: row.category.clone(),
                })?;

            Ok(BudgetLine {
                unit,
                category,
                description: row.text,
                available: Amount::coerce(&row.available),
            })
        }))
}
