use crate::config::MappingConfig;
use crate::error::ReconError;
use crate::model::Table;
use crate::normalize::normalize_column_name;

/// One (benefits field, payroll field) pair from the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    pub benefits: String,
    pub payroll: String,
}

/// The validated field mapping: ordered pairs, unique by benefits-side name,
/// with one pair designated as the employee identifier.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub pairs: Vec<MappedField>,
    key_index: usize,
}

impl FieldMapping {
    pub fn from_table(table: &Table, config: &MappingConfig) -> Result<Self, ReconError> {
        for column in [&config.benefits_column, &config.payroll_column] {
            if !table.has_column(column) {
                return Err(ReconError::MissingMappingColumn { column: column.clone() });
            }
        }

        let mut pairs: Vec<MappedField> = Vec::new();
        for row in &table.rows {
            let benefits = normalize_column_name(&row.get(&config.benefits_column).display());
            let payroll = normalize_column_name(&row.get(&config.payroll_column).display());
            if benefits.is_empty() || payroll.is_empty() {
                continue;
            }
            // first occurrence wins per benefits-side name
            if pairs.iter().any(|p| p.benefits == benefits) {
                continue;
            }
            pairs.push(MappedField { benefits, payroll });
        }

        let key_index = pairs
            .iter()
            .position(|p| p.benefits.to_lowercase().contains("employee id"))
            .ok_or(ReconError::MissingIdentifierMapping)?;

        Ok(Self { pairs, key_index })
    }

    /// The identifier pair designated by the mapping table.
    pub fn key(&self) -> &MappedField {
        &self.pairs[self.key_index]
    }

    /// Mapped pairs to compare, in mapping order, identifier excluded.
    pub fn compare_fields(&self) -> impl Iterator<Item = &MappedField> {
        self.pairs
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.key_index)
            .map(|(_, p)| p)
    }
}
