use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub sources: Sources,
    pub mapping: MappingConfig,
    #[serde(default)]
    pub policy: RulePolicy,
}

#[derive(Debug, Deserialize)]
pub struct Sources {
    pub benefits: SourceConfig,
    pub payroll: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
}

// ---------------------------------------------------------------------------
// Mapping table shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    pub file: String,
    /// Header of the benefits-side field-name column.
    #[serde(default = "default_benefits_column")]
    pub benefits_column: String,
    /// Header of the payroll-side field-name column.
    #[serde(default = "default_payroll_column")]
    pub payroll_column: String,
}

fn default_benefits_column() -> String {
    "Benefits Field".into()
}

fn default_payroll_column() -> String {
    "Payroll Field".into()
}

// ---------------------------------------------------------------------------
// Rule policy
// ---------------------------------------------------------------------------

/// Keyword sets, synonym maps, and allow-lists consumed by the normalizer
/// and classifier. Immutable after load; every set can be overridden from
/// the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct RulePolicy {
    #[serde(default = "default_middle_initial_keywords")]
    pub middle_initial_keywords: Vec<String>,
    #[serde(default = "default_gender_keywords")]
    pub gender_keywords: Vec<String>,
    #[serde(default = "default_veteran_keywords")]
    pub veteran_keywords: Vec<String>,
    #[serde(default = "default_job_title_keywords")]
    pub job_title_keywords: Vec<String>,
    #[serde(default = "default_tax_id_keywords")]
    pub tax_id_keywords: Vec<String>,
    #[serde(default = "default_phone_keywords")]
    pub phone_keywords: Vec<String>,
    #[serde(default = "default_postal_keywords")]
    pub postal_keywords: Vec<String>,
    #[serde(default = "default_date_keywords")]
    pub date_keywords: Vec<String>,
    #[serde(default = "default_numeric_keywords")]
    pub numeric_keywords: Vec<String>,
    #[serde(default = "default_job_title_synonyms")]
    pub job_title_synonyms: BTreeMap<String, String>,
    /// Specific payroll termination reasons that an unspecified benefits
    /// reason ("Other") is allowed to match.
    #[serde(default = "default_allowed_termination_reasons")]
    pub allowed_termination_reasons: BTreeSet<String>,
    /// Pad tax identifiers to 9 digits before comparing. Restores leading
    /// zeros dropped by numeric spreadsheet storage.
    #[serde(default = "default_pad_tax_ids")]
    pub pad_tax_ids: bool,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            middle_initial_keywords: default_middle_initial_keywords(),
            gender_keywords: default_gender_keywords(),
            veteran_keywords: default_veteran_keywords(),
            job_title_keywords: default_job_title_keywords(),
            tax_id_keywords: default_tax_id_keywords(),
            phone_keywords: default_phone_keywords(),
            postal_keywords: default_postal_keywords(),
            date_keywords: default_date_keywords(),
            numeric_keywords: default_numeric_keywords(),
            job_title_synonyms: default_job_title_synonyms(),
            allowed_termination_reasons: default_allowed_termination_reasons(),
            pad_tax_ids: default_pad_tax_ids(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_middle_initial_keywords() -> Vec<String> {
    strings(&["middle initial"])
}

fn default_gender_keywords() -> Vec<String> {
    strings(&["gender"])
}

fn default_veteran_keywords() -> Vec<String> {
    strings(&["veteran"])
}

fn default_job_title_keywords() -> Vec<String> {
    strings(&["job title", "position title"])
}

fn default_tax_id_keywords() -> Vec<String> {
    strings(&["ssn", "tax id"])
}

fn default_phone_keywords() -> Vec<String> {
    strings(&["phone"])
}

fn default_postal_keywords() -> Vec<String> {
    strings(&["zip", "zipcode", "postal"])
}

fn default_date_keywords() -> Vec<String> {
    strings(&["date", "dob", "birth", "doh", "hire"])
}

fn default_numeric_keywords() -> Vec<String> {
    strings(&["salary", "rate", "hours", "amount"])
}

fn default_job_title_synonyms() -> BTreeMap<String, String> {
    [
        ("admin", "administrator"),
        ("management", "manager"),
        ("dsp owner", "owner"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_allowed_termination_reasons() -> BTreeSet<String> {
    [
        "quit without notice",
        "no reason given",
        "misconduct",
        "abandoned job",
        "advancement (better job with higher pay)",
        "no-show (never started employment)",
        "performance",
        "personal",
        "scheduling conflicts (schedules don't work)",
        "attendance",
    ]
    .into_iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_pad_tax_ids() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be blank".into()));
        }

        for (role, source) in [
            ("benefits", &self.sources.benefits),
            ("payroll", &self.sources.payroll),
        ] {
            if source.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "sources.{role}.file must not be blank"
                )));
            }
        }

        if self.mapping.file.trim().is_empty() {
            return Err(ReconError::ConfigValidation("mapping.file must not be blank".into()));
        }
        if self.mapping.benefits_column.trim().is_empty()
            || self.mapping.payroll_column.trim().is_empty()
        {
            return Err(ReconError::ConfigValidation(
                "mapping column headers must not be blank".into(),
            ));
        }
        if self.mapping.benefits_column == self.mapping.payroll_column {
            return Err(ReconError::ConfigValidation(
                "mapping benefits_column and payroll_column must differ".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Quarterly census audit"

[sources.benefits]
file = "benefits.csv"

[sources.payroll]
file = "payroll.csv"

[mapping]
file = "mapping.csv"
"#;

    #[test]
    fn parse_valid_with_defaults() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Quarterly census audit");
        assert_eq!(config.mapping.benefits_column, "Benefits Field");
        assert_eq!(config.mapping.payroll_column, "Payroll Field");
        assert!(config.policy.pad_tax_ids);
        assert!(config.policy.numeric_keywords.contains(&"salary".to_string()));
        assert_eq!(config.policy.job_title_synonyms["admin"], "administrator");
    }

    #[test]
    fn policy_overrides() {
        let input = format!(
            r#"{VALID}
[policy]
pad_tax_ids = false

[policy.job_title_synonyms]
supervisor = "manager"
"#
        );
        let config = ReconConfig::from_toml(&input).unwrap();
        assert!(!config.policy.pad_tax_ids);
        assert_eq!(config.policy.job_title_synonyms["supervisor"], "manager");
        // Untouched sets keep their defaults
        assert!(config.policy.tax_id_keywords.contains(&"ssn".to_string()));
    }

    #[test]
    fn mapping_column_overrides() {
        let input = r#"
name = "Custom headers"

[sources.benefits]
file = "benefits.csv"

[sources.payroll]
file = "payroll.csv"

[mapping]
file = "mapping.csv"
benefits_column = "HRIS Column"
payroll_column = "Vendor Column"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.mapping.benefits_column, "HRIS Column");
        assert_eq!(config.mapping.payroll_column, "Vendor Column");
    }

    #[test]
    fn reject_blank_source_file() {
        let input = r#"
name = "Bad"

[sources.benefits]
file = ""

[sources.payroll]
file = "payroll.csv"

[mapping]
file = "mapping.csv"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("sources.benefits.file"));
    }

    #[test]
    fn reject_identical_mapping_columns() {
        let input = r#"
name = "Bad"

[sources.benefits]
file = "benefits.csv"

[sources.payroll]
file = "payroll.csv"

[mapping]
file = "mapping.csv"
benefits_column = "Field"
payroll_column = "Field"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }
}
