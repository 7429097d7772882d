use std::path::Path;

use serde::Deserialize;

use super::CsvError;
use crate::Amount;
use crate::model::DisbursementRequest;

#[derive(Debug, Deserialize)]
struct SalaryRow {
    #[serde(rename = "Particular", default)]
    particular: String,
    #[serde(rename = "BA CODE", default)]
    unit: String,
    #[serde(rename = "Commitment Code", default)]
    category: String,
    #[serde(rename = "GL CODE", default)]
    gl_code: String,
    #[serde(rename = "AMOUNT", default)]
    amount: String,
}

/// Read salary disbursements from a csv file, in file order
pub fn read_disbursements(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<DisbursementRequest, CsvError>>, CsvError> {
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
        .into_deserialize::<SalaryRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            Ok(DisbursementRequest {
                particular: row.particular,
                unit: row.unit,
                category: row.category,
                gl_code: row.gl_code,
                amount: Amount::coerce(&row.amount),
            })
        }))
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

    #[test]
    fn unreadable_row_is_reported_and_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"Particular,BA CODE,Commitment Code,GL CODE,AMOUNT\n\
              a,F1001,A10001,1,1\n\
              \xff\xfe,F1002,A10001,1,2\n\
              c,F1003,A10001,1,3\n",
        )
        .unwrap();

        let results: Vec<_> = read_disbursements(file.path()).unwrap().collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().particular, "a");
        assert!(matches!(results[1], Err(CsvError::Parse { line: 3, .. })));
        assert_eq!(results[2].as_ref().unwrap().particular, "c");
    }

    #[test]
    fn read_disbursement() {
        let file = write_csv(
            "Particular,BA CODE,Commitment Code,GL CODE,AMOUNT\n\
             Pay and allowances, 1001 ,A10001,5100,\"2,500\"\n",
        );
        let results: Vec<_> = read_disbursements(file.path()).unwrap().collect();
        assert_eq!(results.len(), 1);

        let request = results.into_iter().next().unwrap().unwrap();
        assert_eq!(request.particular, "Pay and allowances");
        assert_eq!(request.unit, "1001");
        assert_eq!(request.category, "A10001");
        assert_eq!(request.gl_code, "5100");
        assert_eq!(request.amount, Amount::from_float(2500.0));
    }

    #[test]
    fn missing_columns_default_to_empty() {
        let file = write_csv("BA CODE,Commitment Code,AMOUNT\nF1001,A10001,\n");
        let request = read_disbursements(file.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(request.particular, "");
        assert_eq!(request.gl_code, "");
        assert_eq!(request.amount, Amount::ZERO);
    }

    #[test]
    fn rows_keep_file_order() {
        let file = write_csv(
            "Particular,BA CODE,Commitment Code,GL CODE,AMOUNT\n\
             a,F1001,A10001,1,1\n\
             b,F1002,A10001,1,2\n\
             c,F1003,A10001,1,3\n",
        );
        let particulars: Vec<_> = read_disbursements(file.path())
            .unwrap()
            .map(|r| r.unwrap().particular)
            .collect();
        assert_eq!(particulars, vec!["a", "b", "c"]);
    }
}
