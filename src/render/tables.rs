use crate::domain::model::{DailyCount, GroupTotal, InventoryReport, Movement, StatusCount};
use crate::domain::services::text::slug;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Serialize)]
struct InventoryRow<'a> {
    identifier: &'a str,
    timestamp: String,
    status: &'a str,
    style: &'a str,
    customer: &'a str,
    operator: &'a str,
    volume: u32,
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

pub const INVENTORY_HEADERS: [&str; 7] = [
    "Código",
    "Marca temporal",
    "Estado",
    "Estilo",
    "Cliente",
    "Responsable",
    "Litros",
];

/// Header row is written even when there are no records.
pub fn inventory_csv(records: &[Movement]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(INVENTORY_HEADERS)?;
    for record in records {
        writer.serialize(InventoryRow {
            identifier: &record.identifier,
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            status: &record.status,
            style: &record.style,
            customer: record.customer.as_deref().unwrap_or_default(),
            operator: record.operator.as_deref().unwrap_or_default(),
            volume: record.volume,
        })?;
    }
    finish(writer)
}

pub fn group_totals_csv(group_label: &str, totals: &[GroupTotal]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([group_label, "Barriles", "Litros"])?;
    for total in totals {
        writer.write_record([
            total.group.clone(),
            total.units.to_string(),
            total.volume.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn status_counts_csv(counts: &[StatusCount]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Estado", "Barriles"])?;
    for count in counts {
        writer.write_record([count.status.clone(), count.units.to_string()])?;
    }
    finish(writer)
}

pub fn daily_movements_csv(daily: &[DailyCount]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Fecha", "Movimientos"])?;
    for day in daily {
        writer.write_record([day.date.format("%d/%m/%Y").to_string(), day.movements.to_string()])?;
    }
    finish(writer)
}

/// Every table of the report as `(file name, csv bytes)`.
pub fn render_tables(report: &InventoryReport) -> Result<Vec<(String, Vec<u8>)>> {
    let mut tables = vec![
        ("current_inventory.csv".to_string(), inventory_csv(&report.current)?),
        (
            "volume_by_style.csv".to_string(),
            group_totals_csv("Estilo", &report.volume_by_style)?,
        ),
        ("status_counts.csv".to_string(), status_counts_csv(&report.status_counts)?),
        (
            "daily_movements.csv".to_string(),
            daily_movements_csv(&report.daily_movements)?,
        ),
    ];

    for summary in &report.views {
        tables.push((
            format!("view_{}.csv", slug(&summary.view.name)),
            group_totals_csv(summary.view.group_by.label(), &summary.totals)?,
        ));
    }

    Ok(tables)
}
