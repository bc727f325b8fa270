//! Load the write-off dataset from CSV
//!
//! Fixed columns are looked up by header name; recovery curves are collected
//! from every `actual_recovery_amount_M{k}` / `predicted_recovery_amount_M{k}`
//! column. Curve columns must be contiguous from month 0.

use super::data::{actual_column, predicted_column, Account, AccountInfo, Dataset, ProductType, Vintage};
use crate::error::{RecoveryError, RecoveryResult};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Default location of the bundled example dataset
pub const DEFAULT_DATASET_PATH: &str = "data/example.csv";

const ACTUAL_PREFIX: &str = "actual_recovery_amount_M";
const PREDICTED_PREFIX: &str = "predicted_recovery_amount_M";

/// Required fixed columns, in dataset order
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "acct_no",
    "acct_id",
    "cust_id",
    "wrtoff_dt",
    "wrtoff_amt",
    "product_type",
    "months_in_collection",
    "predicted_recovery_probability",
];

/// Column positions resolved from the header row
struct ColumnLayout {
    fixed: [usize; 8],
    actual: Vec<usize>,
    predicted: Vec<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> RecoveryResult<Self> {
        let mut fixed = [0usize; 8];
        for (slot, name) in fixed.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| RecoveryError::MissingColumn { column: name.to_string() })?;
        }

        let actual = curve_columns(headers, ACTUAL_PREFIX, actual_column)?;
        let predicted = curve_columns(headers, PREDICTED_PREFIX, predicted_column)?;

        Ok(Self { fixed, actual, predicted })
    }
}

/// Collect month-indexed curve columns; months must run 0..=max without gaps
fn curve_columns(
    headers: &StringRecord,
    prefix: &str,
    name_for: fn(usize) -> String,
) -> RecoveryResult<Vec<usize>> {
    let mut by_month = BTreeMap::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(month) = header.trim().strip_prefix(prefix).and_then(|m| m.parse::<usize>().ok()) {
            by_month.insert(month, idx);
        }
    }

    let mut columns = Vec::with_capacity(by_month.len());
    for (expected, (month, idx)) in by_month.into_iter().enumerate() {
        if month != expected {
            return Err(RecoveryError::MissingColumn { column: name_for(expected) });
        }
        columns.push(idx);
    }
    Ok(columns)
}

fn field<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("").trim()
}

fn parse_f64(record: &StringRecord, idx: usize, row: usize, column: &str) -> RecoveryResult<f64> {
    let raw = field(record, idx);
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecoveryError::MalformedValue {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// Blank and `nan` cells are missing; anything else must parse to a finite number
fn parse_optional_f64(record: &StringRecord, idx: usize, row: usize, column: String) -> RecoveryResult<Option<f64>> {
    let raw = field(record, idx);
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| RecoveryError::MalformedValue {
            row,
            column,
            value: raw.to_string(),
        })
}

/// `months_in_collection` may be written as a float by upstream tooling ("12.0")
fn parse_months(record: &StringRecord, idx: usize, row: usize) -> RecoveryResult<u32> {
    let raw = field(record, idx);
    let malformed = || RecoveryError::MalformedValue {
        row,
        column: "months_in_collection".to_string(),
        value: raw.to_string(),
    };
    if let Ok(m) = raw.parse::<u32>() {
        return Ok(m);
    }
    let v: f64 = raw.parse().map_err(|_| malformed())?;
    if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Ok(v as u32)
    } else {
        Err(malformed())
    }
}

fn parse_account(record: &StringRecord, layout: &ColumnLayout, row: usize) -> RecoveryResult<Account> {
    let [acct_no, acct_id, cust_id, wrtoff_dt, wrtoff_amt, product_type, months, probability] = layout.fixed;

    let vintage: Vintage = field(record, wrtoff_dt).parse().map_err(|_| RecoveryError::MalformedValue {
        row,
        column: "wrtoff_dt".to_string(),
        value: field(record, wrtoff_dt).to_string(),
    })?;

    let code = field(record, product_type);
    let product_type = ProductType::from_code(code).ok_or_else(|| RecoveryError::UnknownProductType {
        row,
        code: code.to_string(),
    })?;

    let info = AccountInfo {
        acct_no: field(record, acct_no).to_string(),
        acct_id: field(record, acct_id).to_string(),
        cust_id: field(record, cust_id).to_string(),
        vintage,
        wrtoff_amt: parse_f64(record, wrtoff_amt, row, "wrtoff_amt")?,
        product_type,
        months_in_collection: parse_months(record, months, row)?,
        recovery_probability: parse_f64(record, probability, row, "predicted_recovery_probability")?,
    };

    let actual_recovery = layout
        .actual
        .iter()
        .enumerate()
        .map(|(k, &idx)| parse_optional_f64(record, idx, row, actual_column(k)))
        .collect::<RecoveryResult<Vec<_>>>()?;

    let predicted_recovery = layout
        .predicted
        .iter()
        .enumerate()
        .map(|(k, &idx)| parse_optional_f64(record, idx, row, predicted_column(k)))
        .collect::<RecoveryResult<Vec<_>>>()?;

    Ok(Account {
        info,
        actual_recovery,
        predicted_recovery,
    })
}

/// Parse a dataset from raw CSV bytes
pub fn load_dataset_from_bytes(bytes: &[u8]) -> RecoveryResult<Dataset> {
    let version = hex_encode(&Sha256::digest(bytes));

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let layout = ColumnLayout::from_headers(reader.headers()?)?;
    debug!(
        "Dataset layout: {} actual months, {} predicted months",
        layout.actual.len(),
        layout.predicted.len()
    );

    let mut accounts = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        // Row numbers are 1-based and count the header line
        accounts.push(parse_account(&record, &layout, i + 2)?);
    }

    Ok(Dataset {
        accounts,
        version,
        actual_months: layout.actual.len(),
        predicted_months: layout.predicted.len(),
    })
}

/// Load a dataset from any reader (e.g., uploaded file, string buffer)
pub fn load_dataset_from_reader<R: Read>(mut reader: R) -> RecoveryResult<Dataset> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    load_dataset_from_bytes(&bytes)
}

/// Load a dataset from a CSV file
pub fn load_dataset<P: AsRef<Path>>(path: P) -> RecoveryResult<Dataset> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let dataset = load_dataset_from_bytes(&bytes)?;
    info!(
        "Loaded {} accounts across {} vintages from {}",
        dataset.len(),
        dataset.vintages().len(),
        path.display()
    );
    Ok(dataset)
}

/// Hex-encode bytes to lowercase hex string.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
acct_no,acct_id,cust_id,wrtoff_dt,wrtoff_amt,product_type,months_in_collection,predicted_recovery_probability,actual_recovery_amount_M0,actual_recovery_amount_M1,predicted_recovery_amount_M0,predicted_recovery_amount_M1,predicted_recovery_amount_M2
100-1,A1,C1,2021-01,1000,PL,2,0.4,10,20,5,15,25
200,A2,C2,2021-01,500.5,VS,2.0,0.1,0,0,0,5,10
300,A3,C3,2021-02,250,VS,1,0.7,3,,2,4,6
";

    #[test]
    fn test_load_sample_dataset() {
        let dataset = load_dataset_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.actual_months, 2);
        assert_eq!(dataset.predicted_months, 3);
        assert_eq!(dataset.version.len(), 64);

        let first = &dataset.accounts[0];
        assert_eq!(first.info.acct_no, "100-1");
        assert_eq!(first.info.product_type, ProductType::PersonalLoan);
        assert_eq!(first.actual_recovery, vec![Some(10.0), Some(20.0)]);

        let second = &dataset.accounts[1];
        assert_eq!(second.info.months_in_collection, 2);
        assert_eq!(second.info.wrtoff_amt, 500.5);

        let third = &dataset.accounts[2];
        assert_eq!(third.actual_recovery, vec![Some(3.0), None]);

        assert_eq!(
            dataset.vintages(),
            vec![Vintage::new(2021, 1).unwrap(), Vintage::new(2021, 2).unwrap()]
        );
        assert_eq!(dataset.vintage_counts()[0].1, 2);
    }

    #[test]
    fn test_version_is_content_hash() {
        let a = load_dataset_from_reader(SAMPLE.as_bytes()).unwrap();
        let b = load_dataset_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(a.version, b.version);

        let changed = SAMPLE.replace("1000,PL", "1001,PL");
        let c = load_dataset_from_reader(changed.as_bytes()).unwrap();
        assert_ne!(a.version, c.version);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = SAMPLE.replace("cust_id", "customer");
        match load_dataset_from_reader(csv.as_bytes()) {
            Err(RecoveryError::MissingColumn { column }) => assert_eq!(column, "cust_id"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_gap_in_curve_columns() {
        let csv = SAMPLE.replace("predicted_recovery_amount_M1", "predicted_recovery_amount_M7");
        match load_dataset_from_reader(csv.as_bytes()) {
            Err(RecoveryError::MissingColumn { column }) => {
                assert_eq!(column, "predicted_recovery_amount_M1")
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_values_report_row() {
        let csv = SAMPLE.replace("500.5", "lots");
        match load_dataset_from_reader(csv.as_bytes()) {
            Err(RecoveryError::MalformedValue { row, column, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "wrtoff_amt");
            }
            other => panic!("expected MalformedValue, got {:?}", other),
        }

        let csv = SAMPLE.replace(",VS,1,", ",MC,1,");
        assert!(matches!(
            load_dataset_from_reader(csv.as_bytes()),
            Err(RecoveryError::UnknownProductType { row: 4, .. })
        ));
    }

    #[test]
    fn test_infinite_curve_value_rejected() {
        let csv = SAMPLE.replace("0,0,0,5,10", "0,0,0,inf,10");
        match load_dataset_from_reader(csv.as_bytes()) {
            Err(RecoveryError::MalformedValue { row, column, value }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "predicted_recovery_amount_M1");
                assert_eq!(value, "inf");
            }
            other => panic!("expected MalformedValue, got {:?}", other),
        }

        let csv = SAMPLE.replace("10,20,5,15,25", "10,-infinity,5,15,25");
        assert!(matches!(
            load_dataset_from_reader(csv.as_bytes()),
            Err(RecoveryError::MalformedValue { row: 2, .. })
        ));
    }

    #[test]
    fn test_default_selection_takes_latest_two() {
        let dataset = load_dataset_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.default_selection().len(), 2);
    }

    #[test]
    fn test_load_bundled_example() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DATASET_PATH);
        let dataset = load_dataset(path).expect("Failed to load example dataset");
        assert!(!dataset.is_empty());
        assert!(dataset.predicted_months >= 73);
        assert!(dataset.vintages().len() >= 2);
    }
}
