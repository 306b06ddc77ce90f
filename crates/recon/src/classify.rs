use crate::config::RulePolicy;
use crate::model::{Status, Value};
use crate::normalize::{
    collapse_fold, collapse_whitespace, normalize_column_name, text_of, value_is_blank,
    FieldValueNormalizer, Normalized,
};

// ---------------------------------------------------------------------------
// Employee context
// ---------------------------------------------------------------------------

/// Coarse pay-type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayBucket {
    Hourly,
    Salaried,
    Unknown,
}

impl PayBucket {
    pub fn from_text(pay_type: &str) -> Self {
        let s = collapse_fold(pay_type);
        if s.contains("hour") {
            Self::Hourly
        } else if s.contains("salary") || s.contains("salaried") {
            Self::Salaried
        } else {
            Self::Unknown
        }
    }
}

/// Per-employee attributes resolved once before the field loop. Values
/// prefer the payroll source and fall back to benefits.
#[derive(Debug, Clone)]
pub struct EmployeeContext {
    pub employment_status: String,
    pub pay_type: String,
    pub pay_bucket: PayBucket,
}

impl EmployeeContext {
    pub fn new(employment_status: String, pay_type: String) -> Self {
        let pay_bucket = PayBucket::from_text(&pay_type);
        Self { employment_status, pay_type, pay_bucket }
    }
}

/// Which source rows and columns exist for one (employee, field) pair.
#[derive(Debug, Clone, Copy)]
pub struct Presence {
    pub in_benefits: bool,
    pub in_payroll: bool,
    pub benefits_column: bool,
    pub payroll_column: bool,
}

// ---------------------------------------------------------------------------
// Field roles
// ---------------------------------------------------------------------------

fn folded(field: &str) -> String {
    collapse_fold(&normalize_column_name(field))
}

pub fn is_pay_type_field(field: &str) -> bool {
    folded(field).contains("pay type")
}

pub fn is_employment_status_field(field: &str) -> bool {
    folded(field).contains("employment status")
}

pub fn is_termination_reason_field(field: &str) -> bool {
    folded(field).contains("termination reason")
}

pub fn is_annual_salary_field(field: &str) -> bool {
    folded(field).contains("annual salary")
}

pub fn is_hourly_rate_field(field: &str) -> bool {
    let f = folded(field);
    f.contains("hourly pay rate") || f.contains("hourly rate")
}

fn allows_employment_status_value(field: &str) -> bool {
    let f = folded(field);
    f == "status" || f.contains("employment status")
}

/// Guardrail against status values leaking into unrelated columns: a
/// benefits cell reading exactly active/terminated/retired is blanked unless
/// the field is a status field.
pub fn cleanse_benefits_value(field: &str, value: &Value) -> Value {
    if value_is_blank(value) {
        return value.clone();
    }
    let s = text_of(value).trim().to_lowercase();
    let leaked = matches!(s.as_str(), "active" | "terminated" | "retired");
    if leaked && !allows_employment_status_value(field) {
        Value::Empty
    } else {
        value.clone()
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Assigns one status per (employee, field) observation. Pure: no state
/// beyond the per-employee context resolved by the caller.
pub struct Classifier<'p> {
    policy: &'p RulePolicy,
    normalizer: FieldValueNormalizer<'p>,
}

impl<'p> Classifier<'p> {
    pub fn new(policy: &'p RulePolicy) -> Self {
        Self { policy, normalizer: FieldValueNormalizer::new(policy) }
    }

    pub fn classify(
        &self,
        field: &str,
        benefits_raw: &Value,
        payroll_raw: &Value,
        presence: &Presence,
        ctx: &EmployeeContext,
    ) -> Status {
        // Existence dominates field content.
        if presence.in_benefits && !presence.in_payroll {
            return Status::EmployeeMissingInPayroll;
        }
        if presence.in_payroll && !presence.in_benefits {
            return Status::EmployeeMissingInBenefits;
        }
        if !presence.payroll_column {
            return Status::ColumnMissingInPayroll;
        }
        if !presence.benefits_column {
            return Status::ColumnMissingInBenefits;
        }

        if is_pay_type_field(field) {
            let a = Normalized::Text(paytype_for_compare(benefits_raw));
            let b = Normalized::Text(paytype_for_compare(payroll_raw));
            return generic_status(&a, &b);
        }

        let a = self.normalizer.normalize(benefits_raw, field);
        let b = self.normalizer.normalize(payroll_raw, field);

        if is_employment_status_field(field) && !b.is_blank() {
            return employment_status(&a, &b, payroll_raw);
        }

        if is_termination_reason_field(field) {
            let benefits_reason = normalize_reason_text(benefits_raw);
            let payroll_reason = normalize_reason_text(payroll_raw);
            if benefits_reason == "other"
                && self.policy.allowed_termination_reasons.contains(&payroll_reason)
            {
                return Status::Match;
            }
            return generic_status(&a, &b);
        }

        let status = generic_status(&a, &b);
        if status == Status::ValueMissingInBenefits {
            // A field left blank because it does not apply to the employee's
            // pay type is not a discrepancy.
            let waived = match ctx.pay_bucket {
                PayBucket::Hourly => is_annual_salary_field(field),
                PayBucket::Salaried => is_hourly_rate_field(field),
                PayBucket::Unknown => false,
            };
            if waived {
                return Status::Match;
            }
        }
        status
    }
}

/// Generic equality rule over normalized values.
fn generic_status(a: &Normalized, b: &Normalized) -> Status {
    if a == b {
        Status::Match
    } else if a.is_blank() {
        Status::ValueMissingInBenefits
    } else if b.is_blank() {
        Status::ValueMissingInPayroll
    } else {
        Status::Mismatch
    }
}

/// Employment-status rules for a non-blank payroll value.
fn employment_status(a: &Normalized, b: &Normalized, payroll_raw: &Value) -> Status {
    let a_text = a.as_text();
    let b_text = b.as_text();
    let payroll_term = b_text.contains("terminated") || b_text.contains("retired");
    let benefits_active = a_text.starts_with("active");
    let benefits_terminated = a_text.starts_with("terminated");

    // An active benefits record against payroll "on leave" is not a
    // discrepancy; neither is benefits "terminated" against "deceased".
    if (benefits_active && b_text.contains("leave"))
        || (benefits_terminated && b_text.contains("deceased"))
    {
        return Status::Match;
    }
    if a == b {
        return Status::Match;
    }
    // Both sides say terminated/retired in different words.
    if benefits_terminated && payroll_term {
        return Status::Match;
    }

    if benefits_active {
        return Status::ActiveInBenefits;
    }
    if benefits_terminated {
        return Status::TerminatedInBenefits;
    }
    if a.is_blank() {
        if payroll_term {
            return Status::TerminatedInPayroll;
        }
        if b_text.contains("active") {
            return Status::ActiveInPayroll;
        }
        return Status::BenefitsBlank { payroll_value: payroll_raw.display() };
    }
    Status::Mismatch
}

/// Pay-type comparison bucket: salary wording and hourly wording each
/// collapse to one token; anything else compares literally.
fn paytype_for_compare(value: &Value) -> String {
    if value_is_blank(value) {
        return String::new();
    }
    let s = collapse_fold(&text_of(value));
    match s.as_str() {
        "salary" | "salaried" => "salaried".into(),
        "hourly" | "hour" => "hourly".into(),
        _ => s,
    }
}

/// Termination-reason text: straighten curly quotes, strip surrounding
/// quotes, collapse whitespace, case-fold.
fn normalize_reason_text(value: &Value) -> String {
    if value_is_blank(value) {
        return String::new();
    }
    let s = text_of(value)
        .replace('\u{00A0}', " ")
        .replace('\u{2019}', "'")
        .replace(['\u{201C}', '\u{201D}'], "\"");
    let s = collapse_whitespace(&s);
    s.trim_matches('"').trim_matches('\'').trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
