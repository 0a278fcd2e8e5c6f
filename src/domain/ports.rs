use crate::domain::model::{ColumnCandidates, InventoryReport, SheetTable, StatusView};
use crate::domain::services::capacity::CapacityTable;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Human-readable location of `path`, for log lines and the CLI summary.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    /// URL of the CSV export, or `None` when reading a local file or when no
    /// remote source is configured.
    fn source_url(&self) -> Result<Option<String>>;
    fn input_csv(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;
    fn columns(&self) -> &ColumnCandidates;
    fn capacity(&self) -> &CapacityTable;
    fn views(&self) -> &[StatusView];
    fn report_title(&self) -> &str;
    fn charts_enabled(&self) -> bool;
    fn bundle_enabled(&self) -> bool;
    fn histogram_bins(&self) -> usize;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SheetTable>;
    async fn transform(&self, data: SheetTable) -> Result<InventoryReport>;
    async fn load(&self, report: InventoryReport) -> Result<String>;
}
