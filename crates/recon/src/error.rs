use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (blank source file, bad mapping columns, etc.).
    ConfigValidation(String),
    /// The mapping table lacks one of its two required columns.
    MissingMappingColumn { column: String },
    /// No mapping row designates the employee identifier.
    MissingIdentifierMapping,
    /// A source table lacks its identifier column.
    MissingKeyColumn { table: String, column: String },
    /// Malformed CSV text.
    Csv { table: String, message: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingMappingColumn { column } => {
                write!(f, "mapping table must contain column '{column}'")
            }
            Self::MissingIdentifierMapping => write!(
                f,
                "mapping table must include a benefits-side 'Employee ID' row mapped to the payroll key"
            ),
            Self::MissingKeyColumn { table, column } => {
                write!(f, "key column '{column}' not found in {table} table")
            }
            Self::Csv { table, message } => write!(f, "{table} table: {message}"),
        }
    }
}

impl std::error::Error for ReconError {}
