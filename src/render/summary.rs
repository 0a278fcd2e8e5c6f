use crate::domain::model::{GroupTotal, InventoryReport, NoticeLevel};

fn push_totals(lines: &mut Vec<String>, totals: &[GroupTotal]) {
    let width = totals.iter().map(|t| t.group.chars().count()).max().unwrap_or(0);
    for total in totals {
        lines.push(format!(
            "    {:<width$}  {:>4} barriles  {:>6} L",
            total.group,
            total.units,
            total.volume,
            width = width
        ));
    }
}

/// Plain-text summary printed after a run.
pub fn summary_lines(report: &InventoryReport) -> Vec<String> {
    let mut lines = vec![
        format!("📋 {}", report.title),
        format!(
            "  Movimientos: {} leídos, {} descartados",
            report.rows_read, report.rows_dropped
        ),
        format!(
            "  Barriles rastreados: {} ({} L)",
            report.current.len(),
            report.total_volume()
        ),
        "  Litros por estilo:".to_string(),
    ];
    push_totals(&mut lines, &report.volume_by_style);

    for summary in &report.views {
        lines.push(format!(
            "  {}: {} barriles, {} L",
            summary.view.name, summary.total_units, summary.total_volume
        ));
        push_totals(&mut lines, &summary.totals);
    }

    let warnings = report
        .notices
        .iter()
        .filter(|n| n.level == NoticeLevel::Warning)
        .count();
    if warnings > 0 {
        lines.push(format!("  ⚠️ {} avisos (ver dashboard)", warnings));
    }
    lines
}
