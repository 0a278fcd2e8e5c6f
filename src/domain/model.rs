use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One spreadsheet row, cells in sheet column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// 1-based line in the exported sheet (the header is line 1).
    pub line: usize,
    pub values: Vec<String>,
}

impl Record {
    /// Cell at column `index`; `None` past the end of a ragged row.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

/// Raw export as fetched: headers in sheet order plus rows.
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

/// A cleaned movement row with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movement {
    pub identifier: String,
    pub timestamp: NaiveDateTime,
    pub status: String,
    #[serde(skip)]
    pub status_key: String,
    pub style: String,
    pub customer: Option<String>,
    pub operator: Option<String>,
    pub volume: u32,
    pub code_number: Option<f64>,
    #[serde(skip)]
    pub line: usize,
}

/// Header name lists per logical field, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnCandidates {
    pub identifier: Vec<String>,
    pub timestamp: Vec<String>,
    pub status: Vec<String>,
    pub style: Vec<String>,
    pub customer: Vec<String>,
    pub operator: Vec<String>,
    pub timestamp_formats: Vec<String>,
    pub unknown_style: String,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ColumnCandidates {
    fn default() -> Self {
        Self {
            identifier: strings(&["Código", "Codigo", "Código del barril", "ID"]),
            timestamp: strings(&["Marca temporal", "Timestamp", "Fecha"]),
            status: strings(&["Estado", "Estado del barril", "Estado barril", "Status"]),
            style: strings(&[
                "Estilo",
                "Estilo del barril",
                "Estilo cerveza",
                "Estilo_final",
                "Style",
            ]),
            customer: strings(&["Cliente", "Nombre del cliente", "Customer"]),
            operator: strings(&["Responsable", "Operador", "Operator"]),
            timestamp_formats: strings(&[
                "%d/%m/%Y %H:%M:%S",
                "%d/%m/%Y %H:%M",
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%d/%m/%Y",
                "%Y-%m-%d",
            ]),
            unknown_style: "Sin estilo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Style,
    Customer,
    Status,
    Operator,
}

impl GroupBy {
    pub fn label(&self) -> &'static str {
        match self {
            GroupBy::Style => "Estilo",
            GroupBy::Customer => "Cliente",
            GroupBy::Status => "Estado",
            GroupBy::Operator => "Responsable",
        }
    }
}

/// A named status filter over the current records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub name: String,
    pub statuses: Vec<String>,
    #[serde(default = "default_group_by")]
    pub group_by: GroupBy,
}

fn default_group_by() -> GroupBy {
    GroupBy::Style
}

impl StatusView {
    pub fn new(name: &str, statuses: &[&str], group_by: GroupBy) -> Self {
        Self {
            name: name.to_string(),
            statuses: strings(statuses),
            group_by,
        }
    }

    pub fn default_views() -> Vec<StatusView> {
        vec![
            StatusView::new("Barriles llenos en bodega", &["lleno", "en bodega"], GroupBy::Style),
            StatusView::new("Barriles en clientes", &["en cliente", "entregado"], GroupBy::Customer),
            StatusView::new("Barriles vacíos", &["vacio", "sucio", "por lavar"], GroupBy::Style),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub group: String,
    pub units: usize,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub units: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub movements: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Pairwise Pearson correlation; `None` where undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewSummary {
    pub view: StatusView,
    pub records: Vec<Movement>,
    pub totals: Vec<GroupTotal>,
    pub total_units: usize,
    pub total_volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A user-visible message shown on the dashboard in place of a failed section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub section: String,
    pub message: String,
}

impl Notice {
    pub fn warning(section: impl Into<String>, message: impl Into<String>) -> Self {
        let notice = Self {
            level: NoticeLevel::Warning,
            section: section.into(),
            message: message.into(),
        };
        tracing::warn!("⚠️ [{}] {}", notice.section, notice.message);
        notice
    }

    pub fn info(section: impl Into<String>, message: impl Into<String>) -> Self {
        let notice = Self {
            level: NoticeLevel::Info,
            section: section.into(),
            message: message.into(),
        };
        tracing::info!("[{}] {}", notice.section, notice.message);
        notice
    }
}

#[derive(Debug, Clone)]
pub struct Chart {
    /// File stem under `charts/`.
    pub name: String,
    pub title: String,
    pub svg: String,
}

/// Everything the load phase writes.
#[derive(Debug, Clone)]
pub struct InventoryReport {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub source: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub movements: Vec<Movement>,
    pub current: Vec<Movement>,
    pub volume_by_style: Vec<GroupTotal>,
    pub status_counts: Vec<StatusCount>,
    pub views: Vec<ViewSummary>,
    pub daily_movements: Vec<DailyCount>,
    pub volume_histogram: Vec<HistogramBin>,
    pub correlation: CorrelationMatrix,
    pub charts: Vec<Chart>,
    pub notices: Vec<Notice>,
}

impl InventoryReport {
    pub fn total_volume(&self) -> u64 {
        self.current.iter().map(|m| m.volume as u64).sum()
    }

    pub fn chart(&self, name: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.name == name)
    }
}
