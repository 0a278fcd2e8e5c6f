use crate::adapters::sheet::{fetch_sheet_csv, parse_sheet};
use crate::core::{ConfigProvider, InventoryReport, Pipeline, SheetTable, Storage};
use crate::domain::model::{GroupBy, Notice};
use crate::domain::services::aggregate::{
    correlation_matrix, daily_movements, group_volume, numeric_columns, status_counts,
    volume_histogram,
};
use crate::domain::services::clean::clean_records;
use crate::domain::services::latest::latest_per_identifier;
use crate::domain::services::views::apply_view;
use crate::render::bundle::zip_bundle;
use crate::render::charts::render_charts;
use crate::render::dashboard::render_dashboard;
use crate::render::tables::render_tables;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;

pub const DASHBOARD_FILE: &str = "dashboard.html";
pub const BUNDLE_FILE: &str = "keg_report.zip";
pub const NOTICES_FILE: &str = "notices.json";

/// Sheet export -> current keg inventory -> dashboard files.
pub struct InventoryPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> InventoryPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }

    fn source_label(&self) -> String {
        match (self.config.input_csv(), self.config.source_url()) {
            (Some(path), _) => path.to_string(),
            (None, Ok(Some(url))) => url,
            (None, _) => String::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for InventoryPipeline<S, C> {
    async fn extract(&self) -> Result<SheetTable> {
        let bytes = match self.config.input_csv() {
            Some(path) => {
                tracing::debug!("Reading local export: {}", path);
                tokio::fs::read(path).await?
            }
            None => {
                let url = self
                    .config
                    .source_url()?
                    .ok_or_else(|| EtlError::MissingConfigError {
                        field: "source.sheet_id".to_string(),
                    })?;
                fetch_sheet_csv(&self.client, &url).await?
            }
        };

        let table = parse_sheet(&bytes)?;
        if table.headers.is_empty() {
            return Err(EtlError::EmptySource {
                url: self.source_label(),
            });
        }
        Ok(table)
    }

    async fn transform(&self, data: SheetTable) -> Result<InventoryReport> {
        let rows_read = data.records.len();
        let cleaned = clean_records(&data, self.config.columns(), self.config.capacity());
        let mut notices = cleaned.notices;

        let current = latest_per_identifier(&cleaned.movements);
        tracing::debug!(
            "{} movements reduced to {} current kegs",
            cleaned.movements.len(),
            current.len()
        );
        if current.is_empty() && rows_read > 0 {
            notices.push(Notice::warning(
                "inventory",
                "No current inventory could be derived from the sheet",
            ));
        }

        let views = self
            .config
            .views()
            .iter()
            .map(|view| apply_view(&current, view))
            .collect();
        let volumes: Vec<f64> = current.iter().map(|m| m.volume as f64).collect();

        let mut report = InventoryReport {
            title: self.config.report_title().to_string(),
            generated_at: chrono::Local::now().naive_local(),
            source: self.source_label(),
            rows_read,
            rows_dropped: cleaned.dropped,
            volume_by_style: group_volume(&current, GroupBy::Style),
            status_counts: status_counts(&current),
            views,
            daily_movements: daily_movements(&cleaned.movements),
            volume_histogram: volume_histogram(&volumes, self.config.histogram_bins()),
            correlation: correlation_matrix(&numeric_columns(&current)),
            movements: cleaned.movements,
            current,
            charts: Vec::new(),
            notices,
        };

        if self.config.charts_enabled() {
            let (charts, chart_notices) = render_charts(&report);
            tracing::debug!("Rendered {} charts", charts.len());
            report.charts = charts;
            report.notices.extend(chart_notices);
        }

        Ok(report)
    }

    async fn load(&self, report: InventoryReport) -> Result<String> {
        let mut files: Vec<(String, Vec<u8>)> = render_tables(&report)?;
        for chart in &report.charts {
            files.push((format!("charts/{}.svg", chart.name), chart.svg.clone().into_bytes()));
        }
        files.push((NOTICES_FILE.to_string(), serde_json::to_vec_pretty(&report.notices)?));
        files.push((DASHBOARD_FILE.to_string(), render_dashboard(&report).into_bytes()));

        for (path, data) in &files {
            tracing::debug!("Writing {} ({} bytes)", path, data.len());
            self.storage.write_file(path, data).await?;
        }

        if self.config.bundle_enabled() {
            let zip_data = zip_bundle(&files)?;
            tracing::debug!("Writing ZIP bundle ({} bytes) to storage", zip_data.len());
            self.storage.write_file(BUNDLE_FILE, &zip_data).await?;
        }

        Ok(self.storage.location(DASHBOARD_FILE))
    }
}
