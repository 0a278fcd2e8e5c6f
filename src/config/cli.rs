use crate::config::toml_config::ReportConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "keg-report")]
#[command(about = "Builds the keg inventory dashboard from the movements spreadsheet")]
pub struct CliConfig {
    /// Path to a TOML report configuration
    #[arg(short, long)]
    pub config: Option<String>,

    /// Spreadsheet id (the long token in the sheet URL)
    #[arg(long)]
    pub sheet_id: Option<String>,

    /// Tab name inside the spreadsheet
    #[arg(long)]
    pub sheet_name: Option<String>,

    /// Full CSV export URL, overrides --sheet-id
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Read a local CSV export instead of downloading
    #[arg(long)]
    pub input_csv: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Dashboard title
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, help = "Skip chart rendering")]
    pub no_charts: bool,

    #[arg(long, help = "Do not write the zip bundle")]
    pub no_bundle: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory after each phase")]
    pub monitor: bool,

    #[arg(long, help = "Show the resolved configuration and exit")]
    pub dry_run: bool,
}

impl CliConfig {
    /// TOML file (or defaults) with command-line overrides applied on top.
    pub fn report_config(&self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                ReportConfig::from_file(path)?
            }
            None => ReportConfig::default(),
        };

        if let Some(sheet_id) = &self.sheet_id {
            config.source.sheet_id = Some(sheet_id.clone());
        }
        if let Some(sheet_name) = &self.sheet_name {
            config.source.sheet_name = sheet_name.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.source.endpoint = Some(endpoint.clone());
        }
        if let Some(input_csv) = &self.input_csv {
            config.source.input_csv = Some(input_csv.clone());
        }
        if let Some(output_path) = &self.output_path {
            config.output.output_path = output_path.clone();
        }
        if let Some(title) = &self.title {
            config.output.title = title.clone();
        }
        if self.no_charts {
            config.output.charts = false;
        }
        if self.no_bundle {
            config.output.bundle = false;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flags_override_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[source]\nsheet_id = \"from-file\"\n\n[output]\ntitle = \"Desde archivo\"\n")
            .unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let cli = CliConfig::parse_from([
            "keg-report",
            "--config",
            path.as_str(),
            "--sheet-id",
            "from-flag",
            "--no-charts",
        ]);
        let config = cli.report_config().unwrap();

        assert_eq!(config.source.sheet_id.as_deref(), Some("from-flag"));
        assert_eq!(config.output.title, "Desde archivo");
        assert!(!config.output.charts);
        assert!(config.output.bundle);
    }

    #[test]
    fn test_defaults_without_config_file() {
        let cli = CliConfig::parse_from(["keg-report", "--input-csv", "export.csv"]);
        let config = cli.report_config().unwrap();
        assert_eq!(config.source.input_csv.as_deref(), Some("export.csv"));
        assert_eq!(config.output.output_path, "./output");
    }
}
