use crate::domain::model::{GroupTotal, InventoryReport, Movement, NoticeLevel};
use crate::domain::services::text::slug;
use crate::render::tables::TIMESTAMP_FORMAT;
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2rem; color: #222; }
h1 { margin-bottom: 0.2rem; }
.meta { color: #666; margin-bottom: 1.5rem; }
.metrics { display: flex; gap: 1rem; flex-wrap: wrap; }
.metric { border: 1px solid #ddd; border-radius: 6px; padding: 0.8rem 1.2rem; }
.metric b { display: block; font-size: 1.6rem; }
table { border-collapse: collapse; margin: 0.8rem 0; }
th, td { border: 1px solid #ddd; padding: 0.3rem 0.7rem; text-align: left; }
td.num { text-align: right; }
.notice { padding: 0.5rem 0.8rem; margin: 0.3rem 0; border-radius: 4px; }
.notice.warning { background: #fff3cd; }
.notice.info { background: #e7f1ff; }
.charts { display: flex; flex-wrap: wrap; gap: 1rem; }
.chart svg { max-width: 100%; height: auto; }
"#;

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn totals_table(html: &mut String, group_label: &str, totals: &[GroupTotal]) {
    if totals.is_empty() {
        html.push_str("<p><em>Sin registros.</em></p>\n");
        return;
    }
    let _ = writeln!(
        html,
        "<table><tr><th>{}</th><th>Barriles</th><th>Litros</th></tr>",
        escape_html(group_label)
    );
    for total in totals {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape_html(&total.group),
            total.units,
            total.volume
        );
    }
    let units: usize = totals.iter().map(|t| t.units).sum();
    let volume: u64 = totals.iter().map(|t| t.volume).sum();
    let _ = writeln!(
        html,
        "<tr><th>Total</th><th class=\"num\">{}</th><th class=\"num\">{}</th></tr></table>",
        units, volume
    );
}

fn movements_table(html: &mut String, records: &[Movement]) {
    if records.is_empty() {
        html.push_str("<p><em>Sin registros.</em></p>\n");
        return;
    }
    html.push_str(
        "<table><tr><th>Código</th><th>Marca temporal</th><th>Estado</th><th>Estilo</th>\
         <th>Cliente</th><th>Responsable</th><th>Litros</th></tr>\n",
    );
    for m in records {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>",
            escape_html(&m.identifier),
            m.timestamp.format(TIMESTAMP_FORMAT),
            escape_html(&m.status),
            escape_html(&m.style),
            escape_html(m.customer.as_deref().unwrap_or_default()),
            escape_html(m.operator.as_deref().unwrap_or_default()),
            m.volume
        );
    }
    html.push_str("</table>\n");
}

fn charts(html: &mut String, report: &InventoryReport, names: &[String]) {
    let found: Vec<_> = names.iter().filter_map(|n| report.chart(n)).collect();
    if found.is_empty() {
        return;
    }
    html.push_str("<div class=\"charts\">\n");
    for chart in found {
        let _ = writeln!(
            html,
            "<figure class=\"chart\" id=\"chart-{}\">{}<figcaption>{}</figcaption></figure>",
            escape_html(&chart.name),
            chart.svg,
            escape_html(&chart.title)
        );
    }
    html.push_str("</div>\n");
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Self-contained HTML page: tables, inline SVG charts and notices.
pub fn render_dashboard(report: &InventoryReport) -> String {
    let mut html = String::new();
    let title = escape_html(&report.title);

    let _ = writeln!(
        html,
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>",
        title, STYLE
    );
    let _ = writeln!(html, "<h1>{}</h1>", title);
    let _ = writeln!(
        html,
        "<div class=\"meta\">Generado {} &middot; fuente: {}</div>",
        report.generated_at.format(TIMESTAMP_FORMAT),
        escape_html(&report.source)
    );

    let _ = writeln!(
        html,
        "<div class=\"metrics\">\
         <div class=\"metric\"><b>{}</b>movimientos leídos</div>\
         <div class=\"metric\"><b>{}</b>filas descartadas</div>\
         <div class=\"metric\"><b>{}</b>barriles rastreados</div>\
         <div class=\"metric\"><b>{}</b>litros en total</div></div>",
        report.rows_read,
        report.rows_dropped,
        report.current.len(),
        report.total_volume()
    );

    if !report.notices.is_empty() {
        html.push_str("<section id=\"notices\">\n<h2>Avisos</h2>\n");
        for notice in &report.notices {
            let class = match notice.level {
                NoticeLevel::Warning => "warning",
                NoticeLevel::Info => "info",
            };
            let _ = writeln!(
                html,
                "<div class=\"notice {}\"><b>{}</b>: {}</div>",
                class,
                escape_html(&notice.section),
                escape_html(&notice.message)
            );
        }
        html.push_str("</section>\n");
    }

    html.push_str("<section id=\"summary\">\n<h2>Litros por estilo</h2>\n");
    totals_table(&mut html, "Estilo", &report.volume_by_style);
    charts(&mut html, report, &names(&["volume_by_style", "units_by_status"]));
    html.push_str("<h3>Barriles por estado</h3>\n");
    if report.status_counts.is_empty() {
        html.push_str("<p><em>Sin registros.</em></p>\n");
    } else {
        html.push_str("<table><tr><th>Estado</th><th>Barriles</th></tr>\n");
        for count in &report.status_counts {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td class=\"num\">{}</td></tr>",
                escape_html(&count.status),
                count.units
            );
        }
        html.push_str("</table>\n");
    }
    html.push_str("</section>\n");

    for summary in &report.views {
        let view_slug = slug(&summary.view.name);
        let _ = writeln!(
            html,
            "<section id=\"view-{}\">\n<h2>{}</h2>\n<p>Estados: {} &middot; {} barriles &middot; {} litros</p>",
            view_slug,
            escape_html(&summary.view.name),
            escape_html(&summary.view.statuses.join(", ")),
            summary.total_units,
            summary.total_volume
        );
        totals_table(&mut html, summary.view.group_by.label(), &summary.totals);
        charts(
            &mut html,
            report,
            &[format!("view_{}_bar", view_slug), format!("view_{}_pie", view_slug)],
        );
        html.push_str("<details><summary>Detalle</summary>\n");
        movements_table(&mut html, &summary.records);
        html.push_str("</details>\n</section>\n");
    }

    html.push_str("<section id=\"current\">\n<h2>Inventario actual (último movimiento por barril)</h2>\n");
    movements_table(&mut html, &report.current);
    html.push_str("</section>\n");

    html.push_str("<section id=\"extra\">\n<h2>Visualizaciones adicionales</h2>\n");
    charts(
        &mut html,
        report,
        &names(&[
            "daily_movements",
            "code_vs_volume_scatter",
            "volume_histogram",
            "volume_by_style_box",
            "correlation_heatmap",
            "code_vs_volume_bubble",
        ]),
    );
    html.push_str("</section>\n</body>\n</html>\n");

    html
}
