use std::collections::BTreeMap;

use crate::model::{ComparisonRow, FieldSummary, RunSummary};

/// Source population sizes and mapping facts, computed by the engine before
/// the comparison loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Populations {
    pub employees_in_benefits: usize,
    pub employees_in_payroll: usize,
    pub employees_in_both: usize,
    pub mapped_fields: usize,
    pub payroll_columns_missing: usize,
}

/// Per-field status-bucket counts, one summary per mapped field in mapping
/// order. Fields with no detail rows still get a zero-count entry.
pub fn field_summaries(detail: &[ComparisonRow], field_order: &[String]) -> Vec<FieldSummary> {
    let mut by_field: BTreeMap<&str, BTreeMap<String, usize>> = BTreeMap::new();
    for row in detail {
        *by_field
            .entry(row.field.as_str())
            .or_default()
            .entry(row.status.bucket().to_string())
            .or_insert(0) += 1;
    }

    field_order
        .iter()
        .map(|field| {
            let counts = by_field.remove(field.as_str()).unwrap_or_default();
            let total = counts.values().sum();
            FieldSummary { field: field.clone(), total, counts }
        })
        .collect()
}

/// Whole-run metric table.
pub fn run_summary(detail: &[ComparisonRow], pops: &Populations) -> RunSummary {
    let not_ok_rows = detail.iter().filter(|r| !r.status.is_match()).count();
    RunSummary {
        employees_in_benefits: pops.employees_in_benefits,
        employees_in_payroll: pops.employees_in_payroll,
        employees_in_both: pops.employees_in_both,
        benefits_only: pops.employees_in_benefits - pops.employees_in_both,
        payroll_only: pops.employees_in_payroll - pops.employees_in_both,
        mapped_fields: pops.mapped_fields,
        payroll_columns_missing: pops.payroll_columns_missing,
        total_rows: detail.len(),
        not_ok_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn row(field: &str, status: Status) -> ComparisonRow {
        ComparisonRow {
            employee_id: "1".into(),
            employment_status: "Active".into(),
            pay_type: "Hourly".into(),
            field: field.into(),
            benefits_value: String::new(),
            payroll_value: String::new(),
            status,
        }
    }

    #[test]
    fn field_counts_and_totals() {
        let detail = vec![
            row("First Name", Status::Match),
            row("First Name", Status::Match),
            row("First Name", Status::Mismatch),
            row("Zip", Status::ValueMissingInPayroll),
        ];
        let order = vec!["First Name".to_string(), "Zip".to_string()];
        let summaries = field_summaries(&detail, &order);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].field, "First Name");
        assert_eq!(summaries[0].total, 3);
        assert_eq!(summaries[0].counts["match"], 2);
        assert_eq!(summaries[0].counts["mismatch"], 1);
        assert_eq!(summaries[1].total, 1);
        assert_eq!(summaries[1].counts["value_missing_in_payroll"], 1);
    }

    #[test]
    fn unseen_fields_report_zero() {
        let order = vec!["Ghost".to_string()];
        let summaries = field_summaries(&[], &order);
        assert_eq!(summaries[0].total, 0);
        assert!(summaries[0].counts.is_empty());
    }

    #[test]
    fn detail_statuses_share_one_bucket() {
        let detail = vec![
            row("Employment Status", Status::BenefitsBlank { payroll_value: "A".into() }),
            row("Employment Status", Status::BenefitsBlank { payroll_value: "B".into() }),
        ];
        let order = vec!["Employment Status".to_string()];
        let summaries = field_summaries(&detail, &order);
        assert_eq!(summaries[0].counts["benefits_blank"], 2);
    }

    #[test]
    fn run_summary_counts() {
        let detail = vec![
            row("First Name", Status::Match),
            row("First Name", Status::Mismatch),
            row("Zip", Status::EmployeeMissingInPayroll),
        ];
        let pops = Populations {
            employees_in_benefits: 3,
            employees_in_payroll: 2,
            employees_in_both: 1,
            mapped_fields: 2,
            payroll_columns_missing: 0,
        };
        let summary = run_summary(&detail, &pops);
        assert_eq!(summary.benefits_only, 2);
        assert_eq!(summary.payroll_only, 1);
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.not_ok_rows, 2);
        let metrics = summary.metrics();
        assert_eq!(metrics[2], ("Employees present in both", 1));
    }
}
