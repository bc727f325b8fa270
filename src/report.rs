//! Report tables and exports for forecast outcomes
//!
//! The summary table has one formatted row per target recovery rate. The
//! detail export is one workbook per run with a worksheet per target rate
//! (`1%`, `2%`, ...) listing the selected accounts.

use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::account::ProductType;
use crate::error::RecoveryResult;
use crate::forecast::{ForecastOutcome, ForecastRequest, RecoveryCurve, ThresholdRow};
use crate::format::{human_format, round_to};

/// One formatted line of the recovery breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Target recovery rate")]
    pub target_rate: String,

    #[serde(rename = "Predicted recovery rate")]
    pub predicted_rate: String,

    #[serde(rename = "#Sellable accounts (All%: PL%, Visa%)")]
    pub sellable_accounts: String,

    #[serde(rename = "Total write-off amount: PL$, Visa$")]
    pub write_off: String,

    #[serde(rename = "Predicted recovery amount: PL$, Visa$")]
    pub predicted_recovery: String,
}

impl SummaryRow {
    pub fn from_threshold(row: &ThresholdRow) -> Self {
        let totals = row.totals();
        let pl = row.split.get(ProductType::PersonalLoan);
        let visa = row.split.get(ProductType::Visa);

        Self {
            target_rate: format!("{}%", row.target_rate_pct),
            predicted_rate: format!("%{}", human_format(round_to(row.predicted_rate_pct, 1))),
            sellable_accounts: format!(
                "{} (%{}: %{}, %{})",
                human_format(totals.accounts as f64),
                human_format(row.coverage_pct),
                human_format(row.product_share_pct(ProductType::PersonalLoan)),
                human_format(row.product_share_pct(ProductType::Visa)),
            ),
            write_off: format!(
                "${}: ${}, ${}",
                human_format(totals.write_off),
                human_format(pl.write_off),
                human_format(visa.write_off),
            ),
            predicted_recovery: format!(
                "${}: ${}, ${}",
                human_format(totals.predicted_recovery),
                human_format(pl.predicted_recovery),
                human_format(visa.predicted_recovery),
            ),
        }
    }
}

/// Formatted summary table for an outcome
pub fn summary_rows(outcome: &ForecastOutcome) -> Vec<SummaryRow> {
    outcome.thresholds.rows.iter().map(SummaryRow::from_threshold).collect()
}

/// Write the summary table as CSV
pub fn write_summary_csv<W: Write>(writer: W, rows: &[SummaryRow]) -> RecoveryResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export name for a request: vintages, horizon and discount rate
pub fn export_name(request: &ForecastRequest) -> String {
    let dates: Vec<String> = request.normalized_vintages().iter().map(|v| v.compact()).collect();
    format!(
        "recovery_in_{}_within_next_{}_months_with_{}%_discount_rate",
        dates.join("_"),
        request.horizon_months,
        request.discount_rate_pct
    )
}

/// Header row of a detail sheet
pub fn detail_columns(horizon: u32) -> [String; 8] {
    [
        "acct_no".to_string(),
        "acct_id".to_string(),
        "cust_id".to_string(),
        "wrtoff_dt".to_string(),
        "wrtoff_amt".to_string(),
        "product_type".to_string(),
        "months_in_collection".to_string(),
        format!("predicted_recovery_rate_M{}", horizon),
    ]
}

/// Build the detail workbook: one left-aligned worksheet per target rate
pub fn detail_workbook(outcome: &ForecastOutcome) -> RecoveryResult<Workbook> {
    let mut workbook = Workbook::new();
    let left = Format::new().set_align(FormatAlign::Left);
    let columns = detail_columns(outcome.request.horizon_months);

    for row in &outcome.thresholds.rows {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(format!("{}%", row.target_rate_pct))?;

        for (col, name) in columns.iter().enumerate() {
            let col = col as u16;
            worksheet.set_column_format(col, &left)?;
            worksheet.write_string_with_format(0, col, name, &left)?;
        }

        for (i, account) in outcome.selected(row).iter().enumerate() {
            let r = i as u32 + 1;
            let info = &account.info;
            worksheet.write_string_with_format(r, 0, &info.acct_no, &left)?;
            worksheet.write_string_with_format(r, 1, &info.acct_id, &left)?;
            worksheet.write_string_with_format(r, 2, &info.cust_id, &left)?;
            worksheet.write_string_with_format(r, 3, info.vintage.to_string(), &left)?;
            worksheet.write_number_with_format(r, 4, info.wrtoff_amt, &left)?;
            worksheet.write_string_with_format(r, 5, info.product_type.code(), &left)?;
            worksheet.write_number_with_format(r, 6, info.months_in_collection, &left)?;
            worksheet.write_number_with_format(r, 7, account.recovery_rate_pct, &left)?;
        }
    }

    Ok(workbook)
}

/// Save the detail workbook as `<export_name>.xlsx` under `root`; returns its path
pub fn export_details(root: &Path, outcome: &ForecastOutcome) -> RecoveryResult<PathBuf> {
    std::fs::create_dir_all(root)?;
    let path = root.join(format!("{}.xlsx", export_name(&outcome.request)));

    let mut workbook = detail_workbook(outcome)?;
    workbook.save(&path)?;

    log::info!("Wrote {} detail sheets to {}", outcome.thresholds.rows.len(), path.display());
    Ok(path)
}

#[derive(Serialize)]
struct CurveRecord {
    vintage: String,
    month: u32,
    date: Option<chrono::NaiveDate>,
    already_recovered_pct: Option<f64>,
    predicted_pct: Option<f64>,
}

/// Write recovery curves in long format, one line per (vintage, month)
pub fn write_curves_csv<W: Write>(writer: W, curves: &[RecoveryCurve]) -> RecoveryResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for curve in curves {
        for point in &curve.points {
            csv_writer.serialize(CurveRecord {
                vintage: curve.vintage.to_string(),
                month: point.month,
                date: point.date,
                already_recovered_pct: point.already_recovered_pct,
                predicted_pct: point.predicted_pct,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountInfo, Vintage};
    use crate::forecast::{select_thresholds, ProductSplit, RankedAccount, RankingTable, SegmentTotals};

    fn row() -> ThresholdRow {
        ThresholdRow {
            target_rate_pct: 12,
            prefix_len: 1500,
            coverage_pct: 37.5,
            predicted_rate_pct: 12.04,
            split: ProductSplit {
                personal_loan: SegmentTotals {
                    accounts: 600,
                    write_off: 1_234_567.0,
                    predicted_recovery: 150_000.0,
                },
                visa: SegmentTotals {
                    accounts: 900,
                    write_off: 765_433.0,
                    predicted_recovery: 90_800.0,
                },
            },
        }
    }

    #[test]
    fn test_summary_row_formatting() {
        let summary = SummaryRow::from_threshold(&row());
        assert_eq!(summary.target_rate, "12%");
        assert_eq!(summary.predicted_rate, "%12");
        assert_eq!(summary.sellable_accounts, "1.5K (%37.5: %40, %60)");
        assert_eq!(summary.write_off, "$2M: $1.23M, $765K");
        assert_eq!(summary.predicted_recovery, "$241K: $150K, $90.8K");
    }

    #[test]
    fn test_summary_csv_headers() {
        let mut out = Vec::new();
        write_summary_csv(&mut out, &[SummaryRow::from_threshold(&row())]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("Target recovery rate,Predicted recovery rate,"));
        assert!(header.contains("Total write-off amount: PL$, Visa$"));
    }

    #[test]
    fn test_export_name() {
        let request = ForecastRequest::new(vec![Vintage::new(2021, 2).unwrap(), Vintage::new(2020, 11).unwrap()])
            .with_horizon(24)
            .with_discount_rate(3.6);
        assert_eq!(
            export_name(&request),
            "recovery_in_202011_202102_within_next_24_months_with_3.6%_discount_rate"
        );
    }

    fn ranked(id: &str, wrtoff_amt: f64, marginal: f64, product_type: ProductType) -> RankedAccount {
        RankedAccount {
            info: AccountInfo {
                acct_no: id.into(),
                acct_id: format!("A{}", id),
                cust_id: format!("C{}", id),
                vintage: Vintage::new(2021, 3).unwrap(),
                wrtoff_amt,
                product_type,
                months_in_collection: 4,
                recovery_probability: 0.2,
            },
            marginal_recovery: marginal,
            recovery_rate_pct: marginal / wrtoff_amt * 100.0,
        }
    }

    fn outcome() -> ForecastOutcome {
        // Prefix rates 1%, 2%, 4%: targets 1% and 2% are met, 3% takes every account
        let ranking = RankingTable {
            horizon: 36,
            accounts: vec![
                ranked("1", 100.0, 1.0, ProductType::PersonalLoan),
                ranked("2", 100.0, 3.0, ProductType::Visa),
                ranked("3", 100.0, 8.0, ProductType::PersonalLoan),
            ],
            excluded: Vec::new(),
        };
        let thresholds = select_thresholds(&ranking);
        ForecastOutcome {
            request: ForecastRequest::new(vec![Vintage::new(2021, 3).unwrap()]).with_horizon(36),
            dataset_version: "test".to_string(),
            curves: Vec::new(),
            ranking,
            thresholds,
        }
    }

    #[test]
    fn test_detail_columns() {
        let columns = detail_columns(36);
        assert_eq!(columns[0], "acct_no");
        assert_eq!(columns[6], "months_in_collection");
        assert_eq!(columns[7], "predicted_recovery_rate_M36");
    }

    #[test]
    fn test_detail_workbook_has_one_sheet_per_target() {
        let outcome = outcome();
        assert_eq!(outcome.thresholds.rows.len(), 3);

        let mut workbook = detail_workbook(&outcome).unwrap();
        let names: Vec<String> = workbook.worksheets().iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["1%", "2%", "3%"]);

        let bytes = workbook.save_to_buffer().unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_export_details_writes_named_workbook() {
        let root = std::env::temp_dir().join(format!("recovery_forecast_export_{}", std::process::id()));
        let path = export_details(&root, &outcome()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "recovery_in_202103_within_next_36_months_with_3.6%_discount_rate.xlsx"
        );
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_curve_csv_long_format() {
        use crate::forecast::CurvePoint;

        let vintage = Vintage::new(2021, 1).unwrap();
        let curve = RecoveryCurve {
            vintage,
            observed_months: 1,
            cumulative: true,
            points: vec![
                CurvePoint {
                    month: 0,
                    date: vintage.month_offset(0),
                    already_recovered_pct: Some(1.5),
                    predicted_pct: None,
                },
                CurvePoint {
                    month: 1,
                    date: vintage.month_offset(1),
                    already_recovered_pct: None,
                    predicted_pct: Some(2.5),
                },
            ],
        };
        let mut out = Vec::new();
        write_curves_csv(&mut out, &[curve]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "vintage,month,date,already_recovered_pct,predicted_pct");
        assert_eq!(lines[1], "2021-01,0,2021-01-01,1.5,");
        assert_eq!(lines[2], "2021-01,1,2021-02-01,,2.5");
    }
}
