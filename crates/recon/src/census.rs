//! Census population: project the deduplicated payroll table through the
//! field mapping into enrollment-ready rows. Covers the value transforms
//! only — template handling and styling belong to the output layer.

use std::collections::HashMap;

use crate::classify::PayBucket;
use crate::config::RulePolicy;
use crate::dedupe;
use crate::mapping::FieldMapping;
use crate::model::{Record, Table, Value};
use crate::normalize::{
    collapse_fold, normalize_column_name, parse_date_lenient, text_of, value_is_blank,
};

// ---------------------------------------------------------------------------
// Value transforms
// ---------------------------------------------------------------------------

/// Map a raw termination reason onto the canonical enrollment vocabulary.
/// Unknown or blank reasons report as "Other".
pub fn map_termination_reason(value: &Value) -> String {
    if value_is_blank(value) {
        return "Other".into();
    }
    let s = collapse_fold(&text_of(value));
    canonical_termination_reason(&s).unwrap_or("Other").into()
}

fn canonical_termination_reason(s: &str) -> Option<&'static str> {
    Some(match s {
        "no-show (never started employment)" => "No-show (Never started employment)",
        "personal"
        | "quit without notice"
        | "advancement (better job with higher pay)"
        | "mutual agreement"
        | "voluntary termination of employment" => "Voluntary Termination of Employment",
        "attendance"
        | "no reason given"
        | "performance"
        | "misconduct"
        | "abandoned job"
        | "involuntary termination of employment" => "Involuntary Termination of Employment",
        "deceased" | "death" => "Death",
        "retirement" => "Retirement",
        "permanent disability" => "Permanent Disability",
        "transfer" => "Transfer",
        "other" => "Other",
        _ => return None,
    })
}

/// Full state names become USPS two-letter codes; values already two
/// characters or shorter are upper-cased as-is; anything unrecognized
/// passes through.
pub fn state_abbreviation(value: &Value) -> String {
    if value_is_blank(value) {
        return String::new();
    }
    let s = text_of(value).trim().to_string();
    if s.len() <= 2 {
        return s.to_uppercase();
    }
    match state_code(&s.to_lowercase()) {
        Some(code) => code.into(),
        None => s,
    }
}

fn state_code(name: &str) -> Option<&'static str> {
    Some(match name {
        "alabama" => "AL", "alaska" => "AK", "arizona" => "AZ", "arkansas" => "AR",
        "california" => "CA", "colorado" => "CO", "connecticut" => "CT", "delaware" => "DE",
        "florida" => "FL", "georgia" => "GA", "hawaii" => "HI", "idaho" => "ID",
        "illinois" => "IL", "indiana" => "IN", "iowa" => "IA", "kansas" => "KS",
        "kentucky" => "KY", "louisiana" => "LA", "maine" => "ME", "maryland" => "MD",
        "massachusetts" => "MA", "michigan" => "MI", "minnesota" => "MN", "mississippi" => "MS",
        "missouri" => "MO", "montana" => "MT", "nebraska" => "NE", "nevada" => "NV",
        "new hampshire" => "NH", "new jersey" => "NJ", "new mexico" => "NM", "new york" => "NY",
        "north carolina" => "NC", "north dakota" => "ND", "ohio" => "OH", "oklahoma" => "OK",
        "oregon" => "OR", "pennsylvania" => "PA", "rhode island" => "RI",
        "south carolina" => "SC", "south dakota" => "SD", "tennessee" => "TN", "texas" => "TX",
        "utah" => "UT", "vermont" => "VT", "virginia" => "VA", "washington" => "WA",
        "west virginia" => "WV", "wisconsin" => "WI", "wyoming" => "WY",
        "district of columbia" => "DC",
        _ => return None,
    })
}

/// Enrollment display form of a raw pay-type value, plus its bucket.
/// Unrecognized wording passes through title-cased.
pub fn display_pay_type(raw: &Value) -> (String, PayBucket) {
    if value_is_blank(raw) {
        return (String::new(), PayBucket::Unknown);
    }
    let source = text_of(raw).to_lowercase();
    if source.contains("hour") {
        ("Hourly".into(), PayBucket::Hourly)
    } else if source.contains("sal") || source.contains("exempt") {
        ("Salaried".into(), PayBucket::Salaried)
    } else {
        (title_case(&source), PayBucket::Unknown)
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnClass {
    Salary,
    HourlyRate,
    Hours,
    PayType,
    TermReason,
    JobTitle,
    State,
    Union,
    Flsa,
    DateLike,
    Plain,
}

fn classify_column(name: &str) -> ColumnClass {
    let f = collapse_fold(&normalize_column_name(name));
    let has = |needles: &[&str]| needles.iter().any(|n| f.contains(n));
    if has(&["annual salary"]) {
        ColumnClass::Salary
    } else if has(&["hourly pay", "hourly rate"]) {
        ColumnClass::HourlyRate
    } else if has(&["standard hours", "working hours"]) {
        ColumnClass::Hours
    } else if has(&["pay type", "employment type"]) {
        ColumnClass::PayType
    } else if has(&["termination reason"]) {
        ColumnClass::TermReason
    } else if has(&["job title"]) {
        ColumnClass::JobTitle
    } else if has(&["state"]) && !f.contains("tax") {
        ColumnClass::State
    } else if has(&["union"]) {
        ColumnClass::Union
    } else if has(&["flsa"]) {
        ColumnClass::Flsa
    } else if has(&["date", "dob", "birth", "expire"]) {
        ColumnClass::DateLike
    } else {
        ColumnClass::Plain
    }
}

// ---------------------------------------------------------------------------
// Census generation
// ---------------------------------------------------------------------------

/// Build the census table: one row per surviving payroll record, columns
/// named by the benefits side of the mapping, transforms applied per column
/// role. Fields that do not apply to the employee's pay type are blanked.
pub fn generate_census(payroll: &Table, mapping: &FieldMapping, policy: &RulePolicy) -> Table {
    let survivors = dedupe::reduce_payroll(payroll, &mapping.key().payroll);
    let columns: Vec<String> = mapping.pairs.iter().map(|p| p.benefits.clone()).collect();
    let classes: Vec<ColumnClass> =
        columns.iter().map(|c| classify_column(c)).collect();

    let pay_type_pair = mapping
        .pairs
        .iter()
        .find(|p| classify_column(&p.benefits) == ColumnClass::PayType);

    let rows = survivors
        .iter()
        .map(|record| {
            let (pay_type_display, bucket) = pay_type_pair
                .map(|p| display_pay_type(record.get(&p.payroll)))
                .unwrap_or((String::new(), PayBucket::Unknown));

            let mut fields = HashMap::with_capacity(columns.len());
            for (pair, class) in mapping.pairs.iter().zip(&classes) {
                let raw = record.get(&pair.payroll);
                let base = if value_is_blank(raw) { String::new() } else { raw.display() };
                let value = match class {
                    ColumnClass::Salary => match bucket {
                        PayBucket::Hourly => String::new(),
                        _ => base,
                    },
                    ColumnClass::HourlyRate | ColumnClass::Hours => match bucket {
                        PayBucket::Salaried => String::new(),
                        _ => base,
                    },
                    ColumnClass::PayType => {
                        if pay_type_display.is_empty() { base } else { pay_type_display.clone() }
                    }
                    ColumnClass::TermReason => map_termination_reason(raw),
                    ColumnClass::JobTitle => {
                        let folded = collapse_fold(&base);
                        policy.job_title_synonyms.get(&folded).cloned().unwrap_or(folded)
                    }
                    ColumnClass::State => state_abbreviation(raw),
                    ColumnClass::Union => "Non-Union".into(),
                    ColumnClass::Flsa => match bucket {
                        PayBucket::Hourly => "Non-Exempt".into(),
                        PayBucket::Salaried => "Exempt".into(),
                        PayBucket::Unknown => base,
                    },
                    ColumnClass::DateLike => match raw {
                        Value::Date(d) => d.to_string(),
                        Value::Text(t) => parse_date_lenient(t)
                            .map(|d| d.to_string())
                            .unwrap_or(base),
                        _ => base,
                    },
                    ColumnClass::Plain => base,
                };
                fields.insert(pair.benefits.clone(), Value::Text(value));
            }
            Record::new(fields)
        })
        .collect();

    Table { name: "census".into(), columns, rows }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingConfig;
    use crate::table::load_csv_table;

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    #[test]
    fn termination_reasons_map_to_canonical_vocabulary() {
        assert_eq!(
            map_termination_reason(&text("Misconduct")),
            "Involuntary Termination of Employment"
        );
        assert_eq!(
            map_termination_reason(&text("quit without notice")),
            "Voluntary Termination of Employment"
        );
        assert_eq!(map_termination_reason(&text("Deceased")), "Death");
        assert_eq!(map_termination_reason(&text("won the lottery")), "Other");
        assert_eq!(map_termination_reason(&Value::Empty), "Other");
    }

    #[test]
    fn state_names_abbreviate() {
        assert_eq!(state_abbreviation(&text("Maryland")), "MD");
        assert_eq!(state_abbreviation(&text("district of columbia")), "DC");
        assert_eq!(state_abbreviation(&text("md")), "MD");
        assert_eq!(state_abbreviation(&text("Atlantis")), "Atlantis");
        assert_eq!(state_abbreviation(&Value::Empty), "");
    }

    #[test]
    fn pay_type_display_and_bucket() {
        assert_eq!(display_pay_type(&text("hourly")), ("Hourly".into(), PayBucket::Hourly));
        assert_eq!(display_pay_type(&text("Salary")), ("Salaried".into(), PayBucket::Salaried));
        assert_eq!(display_pay_type(&text("Exempt")), ("Salaried".into(), PayBucket::Salaried));
        assert_eq!(
            display_pay_type(&text("per diem")),
            ("Per Diem".into(), PayBucket::Unknown)
        );
    }

    fn build(mapping_csv: &str, payroll_csv: &str) -> Table {
        let mapping_table = load_csv_table("mapping", mapping_csv).unwrap();
        let config = MappingConfig {
            file: "mapping.csv".into(),
            benefits_column: "Benefits Field".into(),
            payroll_column: "Payroll Field".into(),
        };
        let mapping = FieldMapping::from_table(&mapping_table, &config).unwrap();
        let payroll = load_csv_table("payroll", payroll_csv).unwrap();
        generate_census(&payroll, &mapping, &RulePolicy::default())
    }

    #[test]
    fn census_applies_pay_type_rules() {
        let mapping = "\
Benefits Field,Payroll Field
Employee ID,Associate ID
Pay Type,Pay Class
Annual Salary,Annual Salary Amount
Hourly Pay Rate,Rate 1
Standard Hours,Scheduled Hours
FLSA Classification,FLSA Code
Union Classification,Union Code
";
        let payroll = "\
Associate ID,Pay Class,Annual Salary Amount,Rate 1,Scheduled Hours,FLSA Code,Union Code
1,Hourly,52000,21.50,40,X,Y
2,Salary,90000,43.27,40,X,Y
";
        let census = build(mapping, payroll);
        assert_eq!(census.rows.len(), 2);

        let hourly = &census.rows[0];
        assert_eq!(hourly.get("Pay Type").display(), "Hourly");
        assert_eq!(hourly.get("Annual Salary").display(), "");
        assert_eq!(hourly.get("Hourly Pay Rate").display(), "21.5");
        assert_eq!(hourly.get("FLSA Classification").display(), "Non-Exempt");
        assert_eq!(hourly.get("Union Classification").display(), "Non-Union");

        let salaried = &census.rows[1];
        assert_eq!(salaried.get("Pay Type").display(), "Salaried");
        assert_eq!(salaried.get("Annual Salary").display(), "90000");
        assert_eq!(salaried.get("Hourly Pay Rate").display(), "");
        assert_eq!(salaried.get("Standard Hours").display(), "");
        assert_eq!(salaried.get("FLSA Classification").display(), "Exempt");
    }

    #[test]
    fn census_transforms_reasons_titles_states_dates() {
        let mapping = "\
Benefits Field,Payroll Field
Employee ID,Associate ID
Termination Reason,Reason Code
Job Title,Position Title Text
Work State,State Name
Hire Date,Position Start Date
";
        let payroll = "\
Associate ID,Reason Code,Position Title Text,State Name,Position Start Date
1,misconduct,Admin,Maryland,03/01/2024
";
        let census = build(mapping, payroll);
        let row = &census.rows[0];
        assert_eq!(
            row.get("Termination Reason").display(),
            "Involuntary Termination of Employment"
        );
        assert_eq!(row.get("Job Title").display(), "administrator");
        assert_eq!(row.get("Work State").display(), "MD");
        assert_eq!(row.get("Hire Date").display(), "2024-03-01");
    }

    #[test]
    fn census_deduplicates_payroll_first() {
        let mapping = "\
Benefits Field,Payroll Field
Employee ID,Associate ID
First Name,Legal First Name
";
        let payroll = "\
Associate ID,Legal First Name,Position Status,Position Start Date,Work Location Description
1,Old,Terminated,2019-01-01,
1,New,Active,2023-01-01,HQ
";
        let census = build(mapping, payroll);
        assert_eq!(census.rows.len(), 1);
        assert_eq!(census.rows[0].get("First Name").display(), "New");
    }
}
