//! CSV renderings of the engine's output tables.

use std::fs;
use std::io;
use std::path::Path;

use rosterline_recon::model::{FieldSummary, ReconResult, Table};

use crate::exit_codes::EXIT_RUNTIME;
use crate::CliError;

/// Bucket key → report column header, in report column order.
const CANONICAL_BUCKETS: &[(&str, &str)] = &[
    ("match", "Data Match"),
    ("mismatch", "Data Mismatch"),
    ("value_missing_in_benefits", "Value missing in Benefits (Payroll has value)"),
    ("value_missing_in_payroll", "Value missing in Payroll (Benefits has value)"),
    ("employee_missing_in_benefits", "Employee ID not found in Benefits"),
    ("employee_missing_in_payroll", "Employee ID not found in Payroll"),
    ("column_missing_in_payroll", "Column missing in Payroll table"),
    ("column_missing_in_benefits", "Column missing in Benefits table"),
];

fn runtime(message: String) -> CliError {
    CliError { code: EXIT_RUNTIME, message, hint: None }
}

/// Write the three report tables under `dir` (created if needed).
pub fn write_report(dir: &Path, result: &ReconResult) -> Result<(), CliError> {
    fs::create_dir_all(dir)
        .map_err(|e| runtime(format!("cannot create {}: {e}", dir.display())))?;
    write_summary(&dir.join("summary.csv"), result)?;
    write_field_summary(&dir.join("field_summary_by_status.csv"), &result.field_summary)?;
    write_detail(&dir.join("comparison_detail_allfields.csv"), result)?;
    Ok(())
}

fn writer_for(path: &Path) -> Result<csv::Writer<fs::File>, CliError> {
    csv::Writer::from_path(path)
        .map_err(|e| runtime(format!("cannot write {}: {e}", path.display())))
}

fn finish(path: &Path, mut writer: csv::Writer<fs::File>) -> Result<(), CliError> {
    writer
        .flush()
        .map_err(|e| runtime(format!("cannot write {}: {e}", path.display())))
}

fn write_summary(path: &Path, result: &ReconResult) -> Result<(), CliError> {
    let mut w = writer_for(path)?;
    let write = |w: &mut csv::Writer<fs::File>, record: &[String]| {
        w.write_record(record)
            .map_err(|e| runtime(format!("cannot write {}: {e}", path.display())))
    };
    write(&mut w, &["Metric".into(), "Value".into()])?;
    for (metric, value) in result.summary.metrics() {
        write(&mut w, &[metric.to_string(), value.to_string()])?;
    }
    finish(path, w)
}

fn write_field_summary(path: &Path, summaries: &[FieldSummary]) -> Result<(), CliError> {
    let mut w = writer_for(path)?;
    let write = |w: &mut csv::Writer<fs::File>, record: &[String]| {
        w.write_record(record)
            .map_err(|e| runtime(format!("cannot write {}: {e}", path.display())))
    };

    let mut header: Vec<String> = vec!["Field".into(), "Total".into()];
    header.extend(CANONICAL_BUCKETS.iter().map(|(_, label)| label.to_string()));
    header.push("Other Statuses".into());
    write(&mut w, &header)?;

    for summary in summaries {
        write(&mut w, &field_summary_record(summary))?;
    }
    finish(path, w)
}

/// One field-summary row: canonical bucket counts plus a catch-all for the
/// contextual employment-status outcomes.
fn field_summary_record(summary: &FieldSummary) -> Vec<String> {
    let mut record = vec![summary.field.clone(), summary.total.to_string()];
    let mut canonical_total = 0usize;
    for (bucket, _) in CANONICAL_BUCKETS {
        let count = summary.counts.get(*bucket).copied().unwrap_or(0);
        canonical_total += count;
        record.push(count.to_string());
    }
    record.push((summary.total - canonical_total).to_string());
    record
}

fn write_detail(path: &Path, result: &ReconResult) -> Result<(), CliError> {
    let mut w = writer_for(path)?;
    let write = |w: &mut csv::Writer<fs::File>, record: &[String]| {
        w.write_record(record)
            .map_err(|e| runtime(format!("cannot write {}: {e}", path.display())))
    };
    write(
        &mut w,
        &[
            "Employee ID".into(),
            "Employment Status".into(),
            "Pay Type".into(),
            "Field".into(),
            "Benefits Value".into(),
            "Payroll Value".into(),
            "Status".into(),
        ],
    )?;
    for row in &result.detail {
        write(
            &mut w,
            &[
                row.employee_id.clone(),
                row.employment_status.clone(),
                row.pay_type.clone(),
                row.field.clone(),
                row.benefits_value.clone(),
                row.payroll_value.clone(),
                row.status.to_string(),
            ],
        )?;
    }
    finish(path, w)
}

/// Write a generic table (census output) as CSV to a file or stdout.
pub fn write_table(path: Option<&Path>, table: &Table) -> Result<(), CliError> {
    match path {
        Some(p) => {
            let w = csv::Writer::from_path(p)
                .map_err(|e| runtime(format!("cannot write {}: {e}", p.display())))?;
            stream_table(w, table)
                .map_err(|e| runtime(format!("cannot write {}: {e}", p.display())))
        }
        None => {
            let w = csv::Writer::from_writer(io::stdout());
            stream_table(w, table).map_err(|e| runtime(format!("cannot write census: {e}")))
        }
    }
}

fn stream_table<W: io::Write>(mut w: csv::Writer<W>, table: &Table) -> Result<(), csv::Error> {
    w.write_record(&table.columns)?;
    for row in &table.rows {
        let cells: Vec<String> = table.columns.iter().map(|c| row.get(c).display()).collect();
        w.write_record(&cells)?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn field_summary_record_buckets_and_catch_all() {
        let mut counts = BTreeMap::new();
        counts.insert("match".to_string(), 3);
        counts.insert("mismatch".to_string(), 1);
        counts.insert("benefits_blank".to_string(), 2);
        let summary = FieldSummary { field: "Employment Status".into(), total: 6, counts };
        let record = field_summary_record(&summary);
        assert_eq!(record[0], "Employment Status");
        assert_eq!(record[1], "6");
        assert_eq!(record[2], "3"); // Data Match
        assert_eq!(record[3], "1"); // Data Mismatch
        assert_eq!(*record.last().unwrap(), "2".to_string()); // contextual catch-all
    }
}
