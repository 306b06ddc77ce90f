use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::{field_summaries, run_summary, Populations};
use crate::classify::{
    cleanse_benefits_value, is_pay_type_field, Classifier, EmployeeContext, Presence,
};
use crate::config::ReconConfig;
use crate::dedupe;
use crate::error::ReconError;
use crate::key::normalize_key;
use crate::mapping::FieldMapping;
use crate::model::{
    ComparisonRow, ReconInput, ReconMeta, ReconResult, Record, Table, Value,
};
use crate::normalize::{collapse_fold, normalize_column_name, value_is_blank};

/// Run reconciliation over pre-loaded tables. Returns detail rows plus both
/// summaries, or fails fast on a schema problem before any comparison.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let mapping = FieldMapping::from_table(&input.mapping, &config.mapping)?;
    let key = mapping.key().clone();

    if !input.benefits.has_column(&key.benefits) {
        return Err(ReconError::MissingKeyColumn {
            table: input.benefits.name.clone(),
            column: key.benefits,
        });
    }
    if !input.payroll.has_column(&key.payroll) {
        return Err(ReconError::MissingKeyColumn {
            table: input.payroll.name.clone(),
            column: key.payroll,
        });
    }

    // The benefits export is assumed unique per employee; the payroll export
    // carries one row per position change and gets the status-aware policy.
    let benefits_rows = dedupe::first_occurrence(&input.benefits, &key.benefits);
    let payroll_rows = dedupe::reduce_payroll(&input.payroll, &key.payroll);

    let benefits_idx = index_by_key(&benefits_rows, &key.benefits);
    let payroll_idx = index_by_key(&payroll_rows, &key.payroll);

    let all_keys: BTreeSet<&String> = benefits_idx.keys().chain(payroll_idx.keys()).collect();

    let context_columns = locate_context_columns(&input.benefits, &input.payroll, &mapping);
    let classifier = Classifier::new(&config.policy);

    let mut detail = Vec::new();
    for emp_id in &all_keys {
        let b_rec = benefits_idx.get(*emp_id).copied();
        let p_rec = payroll_idx.get(*emp_id).copied();
        let ctx = resolve_context(&context_columns, b_rec, p_rec);

        for pair in mapping.compare_fields() {
            let benefits_column = input.benefits.has_column(&pair.benefits);
            let payroll_column = input.payroll.has_column(&pair.payroll);
            let presence = Presence {
                in_benefits: b_rec.is_some(),
                in_payroll: p_rec.is_some(),
                benefits_column,
                payroll_column,
            };

            let b_raw = if benefits_column {
                b_rec.map(|r| r.get(&pair.benefits).clone()).unwrap_or(Value::Empty)
            } else {
                Value::Empty
            };
            let b_raw = cleanse_benefits_value(&pair.benefits, &b_raw);
            let p_raw = if payroll_column {
                p_rec.map(|r| r.get(&pair.payroll).clone()).unwrap_or(Value::Empty)
            } else {
                Value::Empty
            };

            let status = classifier.classify(&pair.benefits, &b_raw, &p_raw, &presence, &ctx);
            detail.push(ComparisonRow {
                employee_id: (*emp_id).clone(),
                employment_status: ctx.employment_status.clone(),
                pay_type: ctx.pay_type.clone(),
                field: pair.benefits.clone(),
                benefits_value: b_raw.display(),
                payroll_value: p_raw.display(),
                status,
            });
        }
    }

    let pops = Populations {
        employees_in_benefits: benefits_idx.len(),
        employees_in_payroll: payroll_idx.len(),
        employees_in_both: benefits_idx.keys().filter(|k| payroll_idx.contains_key(*k)).count(),
        mapped_fields: mapping.compare_fields().count(),
        payroll_columns_missing: mapping
            .pairs
            .iter()
            .filter(|p| !input.payroll.has_column(&p.payroll))
            .count(),
    };

    let field_order: Vec<String> = mapping.compare_fields().map(|p| p.benefits.clone()).collect();
    let summary = run_summary(&detail, &pops);
    let field_summary = field_summaries(&detail, &field_order);

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        field_summary,
        detail,
    })
}

/// Index deduped rows by canonical key, skipping blank keys. First
/// occurrence wins, matching the dedup guarantees.
fn index_by_key<'r>(rows: &'r [Record], key_field: &str) -> BTreeMap<String, &'r Record> {
    let mut idx = BTreeMap::new();
    for row in rows {
        let key = normalize_key(row.get(key_field));
        if key.is_empty() {
            continue;
        }
        idx.entry(key).or_insert(row);
    }
    idx
}

// ---------------------------------------------------------------------------
// Per-employee context
// ---------------------------------------------------------------------------

struct ContextColumns {
    benefits_status: Option<String>,
    payroll_status: Option<String>,
    benefits_pay_type: Option<String>,
    payroll_pay_type: Option<String>,
}

fn locate_context_columns(
    benefits: &Table,
    payroll: &Table,
    mapping: &FieldMapping,
) -> ContextColumns {
    let pay_type_pair = mapping.pairs.iter().find(|p| is_pay_type_field(&p.benefits));
    ContextColumns {
        benefits_status: find_employment_status_column(benefits),
        payroll_status: find_employment_status_column(payroll),
        benefits_pay_type: pay_type_pair
            .filter(|p| benefits.has_column(&p.benefits))
            .map(|p| p.benefits.clone()),
        payroll_pay_type: pay_type_pair
            .filter(|p| payroll.has_column(&p.payroll))
            .map(|p| p.payroll.clone()),
    }
}

/// Exact "employment status" header first, then any header mentioning both
/// words.
fn find_employment_status_column(table: &Table) -> Option<String> {
    table
        .columns
        .iter()
        .find(|c| collapse_fold(&normalize_column_name(c)) == "employment status")
        .or_else(|| {
            table.columns.iter().find(|c| {
                let f = collapse_fold(&normalize_column_name(c));
                f.contains("employment") && f.contains("status")
            })
        })
        .cloned()
}

fn resolve_context(
    columns: &ContextColumns,
    b_rec: Option<&Record>,
    p_rec: Option<&Record>,
) -> EmployeeContext {
    let employment_status = prefer_payroll(
        cell_text(p_rec, columns.payroll_status.as_deref()),
        || cell_text(b_rec, columns.benefits_status.as_deref()),
    );
    let pay_type = prefer_payroll(
        cell_text(p_rec, columns.payroll_pay_type.as_deref()),
        || cell_text(b_rec, columns.benefits_pay_type.as_deref()),
    );
    EmployeeContext::new(employment_status, pay_type)
}

fn prefer_payroll(payroll: String, benefits: impl FnOnce() -> String) -> String {
    if payroll.is_empty() {
        benefits()
    } else {
        payroll
    }
}

fn cell_text(rec: Option<&Record>, column: Option<&str>) -> String {
    match (rec, column) {
        (Some(r), Some(c)) => {
            let v = r.get(c);
            if value_is_blank(v) {
                String::new()
            } else {
                v.display()
            }
        }
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
