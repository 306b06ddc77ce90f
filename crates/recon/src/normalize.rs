use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::RulePolicy;
use crate::model::Value;

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Canonical form of a column header: line breaks and NBSP become spaces,
/// whitespace runs collapse, `*` markers and surrounding quotes are stripped.
pub fn normalize_column_name(raw: &str) -> String {
    let s = raw.replace(['\n', '\r', '\u{00A0}'], " ");
    let s = collapse_whitespace(&s);
    let s = s.replace('*', "");
    s.trim_matches('"').trim_matches('\'').trim().to_string()
}

/// Collapse internal whitespace runs to single spaces and trim.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace, trim, case-fold.
pub(crate) fn collapse_fold(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

fn blank_text(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "" | "nan" | "none" | "null")
}

/// Blank-equivalent cells: empty, NaN, or text spelling a null marker.
pub fn value_is_blank(value: &Value) -> bool {
    match value {
        Value::Empty => true,
        Value::Float(f) => f.is_nan(),
        Value::Text(t) => blank_text(t),
        Value::Int(_) | Value::Date(_) => false,
    }
}

/// Plain-text rendering used by digit-oriented rules. Integral floats render
/// without a fractional suffix (`12345678.0` → `"12345678"`).
pub(crate) fn text_of(value: &Value) -> String {
    value.display()
}

pub(crate) fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Lenient multi-format date parse. Returns None rather than erroring.
pub(crate) fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Normalized values
// ---------------------------------------------------------------------------

/// Comparison-normal form of a cell. Blank is `Text("")` for every field
/// kind, so blank-vs-blank compares equal regardless of source typing.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Text(String),
    Number(f64),
}

impl Normalized {
    pub fn blank() -> Self {
        Self::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(t) if t.is_empty())
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(t) => t,
            Self::Number(_) => "",
        }
    }
}

impl fmt::Display for Normalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => write!(f, "{t}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field kinds + dispatch
// ---------------------------------------------------------------------------

/// Semantic type of a field, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    MiddleInitial,
    Gender,
    Veteran,
    JobTitle,
    TaxId,
    Phone,
    PostalCode,
    Date,
    Numeric,
    Text,
}

/// Normalizes raw cell values into comparison-normal form, dispatching on
/// the field name through an ordered keyword-rule table. First match wins.
pub struct FieldValueNormalizer<'p> {
    policy: &'p RulePolicy,
    rules: Vec<(&'p [String], FieldKind)>,
}

impl<'p> FieldValueNormalizer<'p> {
    pub fn new(policy: &'p RulePolicy) -> Self {
        // Priority order is part of the contract: a "Middle Initial DOB"
        // header (unlikely, but headers are user data) resolves as the
        // earlier rule.
        let rules: Vec<(&[String], FieldKind)> = vec![
            (&policy.middle_initial_keywords, FieldKind::MiddleInitial),
            (&policy.gender_keywords, FieldKind::Gender),
            (&policy.veteran_keywords, FieldKind::Veteran),
            (&policy.job_title_keywords, FieldKind::JobTitle),
            (&policy.tax_id_keywords, FieldKind::TaxId),
            (&policy.phone_keywords, FieldKind::Phone),
            (&policy.postal_keywords, FieldKind::PostalCode),
            (&policy.date_keywords, FieldKind::Date),
            (&policy.numeric_keywords, FieldKind::Numeric),
        ];
        Self { policy, rules }
    }

    /// Resolve the semantic kind for a field name.
    pub fn field_kind(&self, field_name: &str) -> FieldKind {
        let folded = collapse_fold(&normalize_column_name(field_name));
        for (keywords, kind) in &self.rules {
            if keywords.iter().any(|k| folded.contains(k.as_str())) {
                return *kind;
            }
        }
        FieldKind::Text
    }

    /// Normalize one raw value for equality comparison. Never fails: coercion
    /// problems fall back to trimmed/case-folded text.
    pub fn normalize(&self, value: &Value, field_name: &str) -> Normalized {
        if value_is_blank(value) {
            return Normalized::blank();
        }
        match self.field_kind(field_name) {
            FieldKind::MiddleInitial => self.middle_initial(value),
            FieldKind::Gender => self.gender(value),
            FieldKind::Veteran => self.veteran(value),
            FieldKind::JobTitle => self.job_title(value),
            FieldKind::TaxId => self.tax_id(value),
            FieldKind::Phone => Normalized::Text(digits_only(&text_of(value))),
            FieldKind::PostalCode => self.postal_code(value),
            FieldKind::Date => self.date(value),
            FieldKind::Numeric => self.numeric(value),
            FieldKind::Text => generic_text(value),
        }
    }

    fn middle_initial(&self, value: &Value) -> Normalized {
        let s = text_of(value);
        match s.chars().find(|c| c.is_ascii_alphabetic()) {
            Some(c) => Normalized::Text(c.to_ascii_lowercase().to_string()),
            None => Normalized::blank(),
        }
    }

    fn gender(&self, value: &Value) -> Normalized {
        let s = collapse_fold(&text_of(value));
        if s.contains("female") || s.contains("woman") {
            Normalized::Text("female".into())
        } else if s.contains("male") || s.contains("man") {
            Normalized::Text("male".into())
        } else {
            Normalized::Text(s)
        }
    }

    fn veteran(&self, value: &Value) -> Normalized {
        let s = collapse_fold(&text_of(value));
        if s.contains("not a protected veteran") {
            Normalized::Text("not a protected veteran".into())
        } else if s.contains("protected veteran") && !s.contains("not") {
            Normalized::Text("protected veteran".into())
        } else {
            Normalized::Text(s)
        }
    }

    fn job_title(&self, value: &Value) -> Normalized {
        let s = collapse_fold(&text_of(value));
        match self.policy.job_title_synonyms.get(&s) {
            Some(canonical) => Normalized::Text(canonical.clone()),
            None => Normalized::Text(s),
        }
    }

    fn tax_id(&self, value: &Value) -> Normalized {
        let digits = digits_only(&text_of(value));
        if digits.is_empty() {
            return Normalized::blank();
        }
        if !self.policy.pad_tax_ids {
            return Normalized::Text(digits);
        }
        let padded = if digits.len() < 9 {
            format!("{digits:0>9}")
        } else if digits.len() > 9 {
            digits[digits.len() - 9..].to_string()
        } else {
            digits
        };
        Normalized::Text(padded)
    }

    fn postal_code(&self, value: &Value) -> Normalized {
        let digits = match value {
            Value::Int(i) => digits_only(&i.to_string()),
            Value::Float(f) if f.fract() == 0.0 => digits_only(&(*f as i64).to_string()),
            other => digits_only(text_of(other).trim()),
        };
        if digits.is_empty() {
            return Normalized::blank();
        }
        let padded = if digits.len() < 5 {
            format!("{digits:0>5}")
        } else {
            digits
        };
        Normalized::Text(padded[..5].to_string())
    }

    fn date(&self, value: &Value) -> Normalized {
        match value {
            Value::Date(d) => Normalized::Text(d.to_string()),
            Value::Text(t) => {
                let trimmed = t.trim();
                match parse_date_lenient(trimmed) {
                    Some(d) => Normalized::Text(d.to_string()),
                    // Unparseable date text compares as itself, by contract.
                    None => Normalized::Text(trimmed.to_string()),
                }
            }
            other => Normalized::Text(text_of(other)),
        }
    }

    fn numeric(&self, value: &Value) -> Normalized {
        match value {
            Value::Int(i) => Normalized::Number(*i as f64),
            Value::Float(f) => Normalized::Number(*f),
            Value::Text(t) => {
                let cleaned: String =
                    t.trim().chars().filter(|c| *c != ',' && *c != '$').collect();
                match cleaned.parse::<f64>() {
                    // Non-finite parses ("inf", "+nan") are not amounts.
                    Ok(n) if n.is_finite() => Normalized::Number(n),
                    _ => generic_text(value),
                }
            }
            Value::Date(_) | Value::Empty => generic_text(value),
        }
    }
}

fn generic_text(value: &Value) -> Normalized {
    Normalized::Text(collapse_fold(&text_of(value)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
