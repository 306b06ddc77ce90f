use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A raw cell value as it arrived from a source export.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
}

static EMPTY: Value = Value::Empty;

impl Value {
    /// The value as it appears in output tables. `Empty` renders as "".
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(t) => t.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Date(d) => d.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One row from a source table, keyed by normalized column name.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub fields: HashMap<String, Value>,
}

impl Record {
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self { fields }
    }

    /// Missing columns read as `Empty`.
    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&EMPTY)
    }
}

/// A named tabular collection with normalized column names.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// First column whose case-folded name contains `needle` (already folded).
    pub fn find_column_containing(&self, needle: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.to_lowercase().contains(needle))
            .map(|c| c.as_str())
    }
}

/// Pre-loaded tables handed to the engine by the I/O layer.
pub struct ReconInput {
    pub benefits: Table,
    pub payroll: Table,
    pub mapping: Table,
}

// ---------------------------------------------------------------------------
// Status taxonomy
// ---------------------------------------------------------------------------

/// Outcome of one employee × field comparison. Exactly one per detail row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Match,
    Mismatch,
    ValueMissingInBenefits,
    ValueMissingInPayroll,
    EmployeeMissingInBenefits,
    EmployeeMissingInPayroll,
    ColumnMissingInBenefits,
    ColumnMissingInPayroll,
    ActiveInBenefits,
    TerminatedInBenefits,
    ActiveInPayroll,
    TerminatedInPayroll,
    /// Employment-status field with a blank benefits value and a payroll
    /// value that reads as neither active nor terminated/retired. Carries
    /// the payroll value for display.
    BenefitsBlank { payroll_value: String },
}

impl Status {
    /// Stable aggregation key. The `BenefitsBlank` payload never varies the
    /// bucket, so detail strings cannot fragment summary counts.
    pub fn bucket(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::ValueMissingInBenefits => "value_missing_in_benefits",
            Self::ValueMissingInPayroll => "value_missing_in_payroll",
            Self::EmployeeMissingInBenefits => "employee_missing_in_benefits",
            Self::EmployeeMissingInPayroll => "employee_missing_in_payroll",
            Self::ColumnMissingInBenefits => "column_missing_in_benefits",
            Self::ColumnMissingInPayroll => "column_missing_in_payroll",
            Self::ActiveInBenefits => "active_in_benefits",
            Self::TerminatedInBenefits => "terminated_in_benefits",
            Self::ActiveInPayroll => "active_in_payroll",
            Self::TerminatedInPayroll => "terminated_in_payroll",
            Self::BenefitsBlank { .. } => "benefits_blank",
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "Data Match"),
            Self::Mismatch => write!(f, "Data Mismatch"),
            Self::ValueMissingInBenefits => {
                write!(f, "Value missing in Benefits (Payroll has value)")
            }
            Self::ValueMissingInPayroll => {
                write!(f, "Value missing in Payroll (Benefits has value)")
            }
            Self::EmployeeMissingInBenefits => write!(f, "Employee ID not found in Benefits"),
            Self::EmployeeMissingInPayroll => write!(f, "Employee ID not found in Payroll"),
            Self::ColumnMissingInBenefits => write!(f, "Column missing in Benefits table"),
            Self::ColumnMissingInPayroll => write!(f, "Column missing in Payroll table"),
            Self::ActiveInBenefits => write!(f, "Active in Benefits"),
            Self::TerminatedInBenefits => write!(f, "Terminated in Benefits"),
            Self::ActiveInPayroll => write!(f, "Active in Payroll"),
            Self::TerminatedInPayroll => write!(f, "Terminated in Payroll"),
            Self::BenefitsBlank { payroll_value } => {
                write!(f, "Value missing in Benefits (Payroll: {payroll_value})")
            }
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Detail + summaries
// ---------------------------------------------------------------------------

/// One (employee, field) observation in the detail table.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub employee_id: String,
    pub employment_status: String,
    pub pay_type: String,
    pub field: String,
    pub benefits_value: String,
    pub payroll_value: String,
    pub status: Status,
}

/// Per-field status counts, in mapping order.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
}

/// Whole-run scalar metrics.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub employees_in_benefits: usize,
    pub employees_in_payroll: usize,
    pub employees_in_both: usize,
    pub benefits_only: usize,
    pub payroll_only: usize,
    pub mapped_fields: usize,
    pub payroll_columns_missing: usize,
    pub total_rows: usize,
    pub not_ok_rows: usize,
}

impl RunSummary {
    /// Named metric/value pairs in report order.
    pub fn metrics(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Employees in Benefits table", self.employees_in_benefits),
            ("Employees in Payroll table", self.employees_in_payroll),
            ("Employees present in both", self.employees_in_both),
            ("Employees missing in Payroll (Benefits only)", self.benefits_only),
            ("Employees missing in Benefits (Payroll only)", self.payroll_only),
            ("Mapped fields total (from mapping table)", self.mapped_fields),
            ("Mapped fields with Payroll column missing", self.payroll_columns_missing),
            ("Total comparison rows (employees x mapped fields)", self.total_rows),
            ("Total NOT OK rows", self.not_ok_rows),
        ]
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: RunSummary,
    pub field_summary: Vec<FieldSummary>,
    pub detail: Vec<ComparisonRow>,
}
