use crate::adapters::sheet::sheet_export_url;
use crate::domain::model::{ColumnCandidates, StatusView};
use crate::domain::ports::ConfigProvider;
use crate::domain::services::capacity::CapacityTable;
use crate::domain::services::text::slug;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_candidates, validate_file_extension, validate_non_empty_string, validate_path,
    validate_positive_number, validate_sheet_id, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SHEET_NAME: &str = "Respuestas de formulario 1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub source: SourceConfig,
    pub columns: ColumnCandidates,
    pub capacity: CapacityTable,
    pub views: Vec<StatusView>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub sheet_id: Option<String>,
    pub sheet_name: String,
    /// Full CSV URL; takes precedence over `sheet_id`.
    pub endpoint: Option<String>,
    /// Local export; takes precedence over both.
    pub input_csv: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_path: String,
    pub title: String,
    pub charts: bool,
    pub bundle: bool,
    pub histogram_bins: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            columns: ColumnCandidates::default(),
            capacity: CapacityTable::default(),
            views: StatusView::default_views(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sheet_id: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            endpoint: None,
            input_csv: None,
            timeout_seconds: 30,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            title: "Inventario de barriles".to_string(),
            charts: true,
            bundle: true,
            histogram_bins: 10,
        }
    }
}

impl ReportConfig {
    /// Loads a report configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses a report configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ProcessingError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Where the rows come from, as shown in logs and on the dashboard.
    pub fn source_label(&self) -> String {
        match (&self.source.input_csv, self.source_url()) {
            (Some(path), _) => path.clone(),
            (None, Ok(Some(url))) => url,
            (None, Ok(None)) => "(no source configured)".to_string(),
            (None, Err(e)) => format!("(invalid source: {})", e),
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        match (&self.source.input_csv, &self.source.endpoint, &self.source.sheet_id) {
            (Some(path), _, _) => {
                validate_path("source.input_csv", path)?;
                validate_file_extension("source.input_csv", path, &["csv"])?;
            }
            (None, Some(endpoint), _) => validate_url("source.endpoint", endpoint)?,
            (None, None, Some(sheet_id)) => {
                validate_sheet_id("source.sheet_id", sheet_id)?;
                validate_non_empty_string("source.sheet_name", &self.source.sheet_name)?;
            }
            (None, None, None) => {
                return Err(EtlError::MissingConfigError {
                    field: "source.sheet_id".to_string(),
                })
            }
        }
        validate_positive_number("source.timeout_seconds", self.source.timeout_seconds as usize, 1)?;

        validate_candidates("columns.identifier", &self.columns.identifier)?;
        validate_candidates("columns.timestamp", &self.columns.timestamp)?;
        validate_candidates("columns.status", &self.columns.status)?;
        validate_candidates("columns.style", &self.columns.style)?;
        validate_candidates("columns.timestamp_formats", &self.columns.timestamp_formats)?;

        let mut seen = HashSet::new();
        for prefix in &self.capacity.prefixes {
            validate_non_empty_string("capacity.prefixes.prefix", &prefix.prefix)?;
            if !seen.insert(prefix.prefix.trim()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "capacity.prefixes".to_string(),
                    value: prefix.prefix.clone(),
                    reason: "Duplicate prefix".to_string(),
                });
            }
        }

        let mut view_files = HashSet::new();
        for view in &self.views {
            validate_non_empty_string("views.name", &view.name)?;
            validate_candidates(&format!("views[{}].statuses", view.name), &view.statuses)?;
            // view outputs are named after the slug
            let view_slug = slug(&view.name);
            if view_files.contains(&view_slug) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "views.name".to_string(),
                    value: view.name.clone(),
                    reason: format!("Another view already writes view_{}.csv", view_slug),
                });
            }
            view_files.insert(view_slug);
        }

        validate_path("output.output_path", &self.output.output_path)?;
        validate_positive_number("output.histogram_bins", self.output.histogram_bins, 1)?;

        Ok(())
    }
}

impl ConfigProvider for ReportConfig {
    fn source_url(&self) -> Result<Option<String>> {
        if self.source.input_csv.is_some() {
            return Ok(None);
        }
        if let Some(endpoint) = &self.source.endpoint {
            return Ok(Some(endpoint.clone()));
        }
        match self.source.sheet_id.as_deref() {
            Some(sheet_id) => sheet_export_url(sheet_id, &self.source.sheet_name).map(Some),
            None => Ok(None),
        }
    }

    fn input_csv(&self) -> Option<&str> {
        self.source.input_csv.as_deref()
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    fn columns(&self) -> &ColumnCandidates {
        &self.columns
    }

    fn capacity(&self) -> &CapacityTable {
        &self.capacity
    }

    fn views(&self) -> &[StatusView] {
        &self.views
    }

    fn report_title(&self) -> &str {
        &self.output.title
    }

    fn charts_enabled(&self) -> bool {
        self.output.charts
    }

    fn bundle_enabled(&self) -> bool {
        self.output.bundle
    }

    fn histogram_bins(&self) -> usize {
        self.output.histogram_bins
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::GroupBy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ReportConfig::from_toml_str("").unwrap();

        assert_eq!(config.source.sheet_name, DEFAULT_SHEET_NAME);
        assert_eq!(config.views.len(), 3);
        assert_eq!(config.capacity.volume_for("58001"), 58);
        assert_eq!(config.output.histogram_bins, 10);
        // no source at all
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[source]
sheet_id = "1AbC"
sheet_name = "Movimientos"

[columns]
identifier = ["Barril"]
status = ["Estado"]

[capacity]
default_volume = 5
prefixes = [{ prefix = "50", volume = 50 }]

[[views]]
name = "Con clientes"
statuses = ["En cliente"]
group_by = "customer"

[output]
output_path = "./reportes"
charts = false
"#;

        let config = ReportConfig::from_toml_str(toml_content).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(
            config.source_url().unwrap().unwrap(),
            "https://docs.google.com/spreadsheets/d/1AbC/gviz/tq?tqx=out%3Acsv&sheet=Movimientos"
        );
        assert_eq!(config.columns.identifier, vec!["Barril"]);
        // unspecified candidate lists keep their defaults
        assert!(config.columns.style.contains(&"Estilo".to_string()));
        assert_eq!(config.capacity.volume_for("50001"), 50);
        assert_eq!(config.capacity.volume_for("20001"), 5);
        assert_eq!(config.views.len(), 1);
        assert_eq!(config.views[0].group_by, GroupBy::Customer);
        assert!(!config.charts_enabled());
        assert!(config.bundle_enabled());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("KEG_REPORT_TEST_SHEET", "sheet-from-env");

        let config = ReportConfig::from_toml_str(
            r#"
[source]
sheet_id = "${KEG_REPORT_TEST_SHEET}"
"#,
        )
        .unwrap();
        assert_eq!(config.source.sheet_id.as_deref(), Some("sheet-from-env"));

        std::env::remove_var("KEG_REPORT_TEST_SHEET");
    }

    #[test]
    fn test_source_precedence() {
        let mut config = ReportConfig::default();
        config.source.sheet_id = Some("abc".to_string());
        config.source.endpoint = Some("http://localhost/sheet.csv".to_string());
        assert_eq!(
            config.source_url().unwrap().as_deref(),
            Some("http://localhost/sheet.csv")
        );

        config.source.input_csv = Some("export.csv".to_string());
        assert_eq!(config.source_url().unwrap(), None);
        assert_eq!(config.source_label(), "export.csv");
    }

    #[test]
    fn test_config_validation_errors() {
        let mut config = ReportConfig::default();
        config.source.endpoint = Some("invalid-url".to_string());
        assert!(config.validate().is_err());

        let mut config = ReportConfig::default();
        config.source.sheet_id = Some("abc".to_string());
        config.capacity = CapacityTable::default();
        config.capacity.prefixes.push(config.capacity.prefixes[0].clone());
        assert!(config.validate().is_err());

        let mut config = ReportConfig::default();
        config.source.sheet_id = Some("abc".to_string());
        config.views[0].statuses.clear();
        assert!(config.validate().is_err());

        let mut config = ReportConfig::default();
        config.source.input_csv = Some("export.xlsx".to_string());
        assert!(config.validate().is_err());

        let mut config = ReportConfig::default();
        config.source.sheet_id = Some("//other.host".to_string());
        assert!(matches!(
            config.validate(),
            Err(EtlError::InvalidConfigValueError { ref field, .. }) if field == "source.sheet_id"
        ));
    }

    #[test]
    fn test_views_with_same_file_name_are_rejected() {
        let mut config = ReportConfig::default();
        config.source.sheet_id = Some("1AbC".to_string());
        config.views = vec![
            StatusView::new("Vacíos", &["vacio"], GroupBy::Style),
            StatusView::new("vacios", &["sucio"], GroupBy::Style),
        ];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("view_vacios.csv"));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[source]\nendpoint = \"https://example.com/sheet.csv\"\n")
            .unwrap();

        let config = ReportConfig::from_file(temp_file.path()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.source_url().unwrap().as_deref(),
            Some("https://example.com/sheet.csv")
        );
    }
}
