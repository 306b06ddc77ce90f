// Rosterline CLI - headless roster reconciliation

mod exit_codes;
mod report;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rosterline_recon::census::generate_census;
use rosterline_recon::mapping::FieldMapping;
use rosterline_recon::model::Table;
use rosterline_recon::{load_csv_table, run, ReconConfig, ReconInput};

use exit_codes::{EXIT_DISCREPANCIES, EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "rosterline")]
#[command(about = "Reconcile benefits and payroll roster exports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  rosterline run audit.toml
  rosterline run audit.toml --json
  rosterline run audit.toml --out-dir report/")]
    Run {
        /// Path to the audit config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write the three report tables as CSV files under this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Validate a config and its mapping table without comparing
    #[command(after_help = "\
Examples:
  rosterline validate audit.toml")]
    Validate {
        /// Path to the audit config file
        config: PathBuf,
    },

    /// Generate a census CSV from the deduplicated payroll export
    #[command(after_help = "\
Examples:
  rosterline census audit.toml --output census.csv")]
    Census {
        /// Path to the audit config file
        config: PathBuf,

        /// Write the census CSV here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run { config, json, out_dir } => cmd_run(&config, json, out_dir.as_deref()),
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Census { config, output } => cmd_census(&config, output.as_deref()),
    };
    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(e.code)
        }
    }
}

fn runtime_err(message: String) -> CliError {
    CliError { code: EXIT_RUNTIME, message, hint: None }
}

fn config_err(message: String) -> CliError {
    CliError { code: EXIT_INVALID_CONFIG, message, hint: None }
}

fn read_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| runtime_err(format!("cannot read {}: {e}", path.display())))?;
    ReconConfig::from_toml(&text).map_err(|e| config_err(e.to_string()))
}

/// Source files resolve relative to the config file's directory.
fn load_table(base: &Path, file: &str, name: &str) -> Result<Table, CliError> {
    let path = base.join(file);
    let data = fs::read_to_string(&path)
        .map_err(|e| runtime_err(format!("cannot read {}: {e}", path.display())))?;
    load_csv_table(name, &data).map_err(|e| runtime_err(e.to_string()))
}

fn cmd_run(config_path: &Path, json: bool, out_dir: Option<&Path>) -> Result<u8, CliError> {
    let config = read_config(config_path)?;
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));

    let input = ReconInput {
        benefits: load_table(base, &config.sources.benefits.file, "benefits")?,
        payroll: load_table(base, &config.sources.payroll.file, "payroll")?,
        mapping: load_table(base, &config.mapping.file, "mapping")?,
    };

    let result = run(&config, &input).map_err(|e| config_err(e.to_string()))?;

    if let Some(dir) = out_dir {
        report::write_report(dir, &result)?;
        eprintln!("wrote report tables to {}", dir.display());
    }

    if json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| runtime_err(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {} benefits / {} payroll employees ({} in both), {} rows — {} not OK",
        result.meta.config_name,
        s.employees_in_benefits,
        s.employees_in_payroll,
        s.employees_in_both,
        s.total_rows,
        s.not_ok_rows,
    );

    Ok(if s.not_ok_rows > 0 { EXIT_DISCREPANCIES } else { EXIT_SUCCESS })
}

fn cmd_validate(config_path: &Path) -> Result<u8, CliError> {
    let config = read_config(config_path)?;
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));

    let mapping_table = load_table(base, &config.mapping.file, "mapping")?;
    let mapping = FieldMapping::from_table(&mapping_table, &config.mapping)
        .map_err(|e| config_err(e.to_string()))?;

    eprintln!(
        "config OK: {} mapped fields, identifier '{}' -> '{}'",
        mapping.pairs.len(),
        mapping.key().benefits,
        mapping.key().payroll,
    );
    Ok(EXIT_SUCCESS)
}

fn cmd_census(config_path: &Path, output: Option<&Path>) -> Result<u8, CliError> {
    let config = read_config(config_path)?;
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));

    let payroll = load_table(base, &config.sources.payroll.file, "payroll")?;
    let mapping_table = load_table(base, &config.mapping.file, "mapping")?;
    let mapping = FieldMapping::from_table(&mapping_table, &config.mapping)
        .map_err(|e| config_err(e.to_string()))?;

    let census = generate_census(&payroll, &mapping, &config.policy);
    report::write_table(output, &census)?;

    if let Some(path) = output {
        eprintln!("wrote {} census rows to {}", census.rows.len(), path.display());
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
name = "CLI test"

[sources.benefits]
file = "benefits.csv"

[sources.payroll]
file = "payroll.csv"

[mapping]
file = "mapping.csv"
"#;

    const MAPPING: &str = "\
Benefits Field,Payroll Field
Employee ID,Associate ID
First Name,Legal First Name
";

    fn write_workspace(dir: &Path, benefits: &str, payroll: &str) -> PathBuf {
        fs::write(dir.join("benefits.csv"), benefits).unwrap();
        fs::write(dir.join("payroll.csv"), payroll).unwrap();
        fs::write(dir.join("mapping.csv"), MAPPING).unwrap();
        let config_path = dir.join("audit.toml");
        fs::write(&config_path, CONFIG).unwrap();
        config_path
    }

    #[test]
    fn run_writes_report_and_reports_discrepancies() {
        let tmp = tempfile::tempdir().unwrap();
        let config = write_workspace(
            tmp.path(),
            "Employee ID,First Name\n1,Avery\n2,Blake\n",
            "Associate ID,Legal First Name\n1,Avery\n2,Blaine\n",
        );
        let out_dir = tmp.path().join("report");
        let code = cmd_run(&config, false, Some(out_dir.as_path())).unwrap();
        assert_eq!(code, EXIT_DISCREPANCIES);
        for file in ["summary.csv", "field_summary_by_status.csv", "comparison_detail_allfields.csv"] {
            assert!(out_dir.join(file).exists(), "{file} missing");
        }
        let detail = fs::read_to_string(out_dir.join("comparison_detail_allfields.csv")).unwrap();
        assert!(detail.contains("Data Mismatch"));
    }

    #[test]
    fn run_clean_input_exits_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let config = write_workspace(
            tmp.path(),
            "Employee ID,First Name\n1,Avery\n",
            "Associate ID,Legal First Name\n1,Avery\n",
        );
        let code = cmd_run(&config, false, None).unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[test]
    fn missing_source_file_is_runtime_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("audit.toml");
        fs::write(&config_path, CONFIG).unwrap();
        let err = cmd_run(&config_path, false, None).unwrap_err();
        assert_eq!(err.code, EXIT_RUNTIME);
    }

    #[test]
    fn invalid_mapping_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("benefits.csv"), "Employee ID\n1\n").unwrap();
        fs::write(tmp.path().join("payroll.csv"), "Associate ID\n1\n").unwrap();
        fs::write(
            tmp.path().join("mapping.csv"),
            "Benefits Field,Payroll Field\nFirst Name,Legal First Name\n",
        )
        .unwrap();
        let config_path = tmp.path().join("audit.toml");
        fs::write(&config_path, CONFIG).unwrap();
        let err = cmd_run(&config_path, false, None).unwrap_err();
        assert_eq!(err.code, EXIT_INVALID_CONFIG);
        assert!(err.message.contains("Employee ID"));
    }

    #[test]
    fn validate_reports_mapping_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let config = write_workspace(
            tmp.path(),
            "Employee ID,First Name\n1,Avery\n",
            "Associate ID,Legal First Name\n1,Avery\n",
        );
        assert_eq!(cmd_validate(&config).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn census_writes_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let config = write_workspace(
            tmp.path(),
            "Employee ID,First Name\n1,Avery\n",
            "Associate ID,Legal First Name\n1,Avery\n1,Stale\n",
        );
        let out = tmp.path().join("census.csv");
        assert_eq!(cmd_census(&config, Some(out.as_path())).unwrap(), EXIT_SUCCESS);
        let written = fs::read_to_string(&out).unwrap();
        assert!(written.starts_with("Employee ID,First Name"));
        // payroll deduped to one row
        assert_eq!(written.lines().count(), 2);
        assert!(written.contains("Avery"));
    }
}
