//! SVG charts for the dashboard.
//!
//! Every chart is drawn in isolation: an error or a panic inside plotters
//! becomes a warning notice and the remaining charts are still produced.

use crate::domain::model::{
    Chart, CorrelationMatrix, DailyCount, GroupTotal, HistogramBin, InventoryReport, Movement,
    Notice,
};
use crate::domain::services::text::slug;
use crate::utils::error::EtlError;
use plotters::coord::Shift;
use plotters::data::Quartiles;
use plotters::element::{Boxplot, Pie};
use plotters::prelude::*;
use plotters::series::{AreaSeries, Histogram};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const SIZE: (u32, u32) = (800, 480);
const HEATMAP_SIZE: (u32, u32) = (480, 400);
const FONT: &str = "sans-serif";

fn render_svg<F>(size: (u32, u32), draw: F) -> DrawResult<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

fn palette(index: usize) -> RGBColor {
    let (r, g, b) = Palette99::pick(index).rgb();
    RGBColor(r, g, b)
}

fn segment_label(value: &SegmentValue<u32>, labels: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i as usize).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

/// Right edge of cell `index` on a segmented axis of `count` cells.
fn segment_edge(index: usize, count: usize) -> SegmentValue<u32> {
    if index + 1 >= count {
        SegmentValue::Last
    } else {
        SegmentValue::Exact((index + 1) as u32)
    }
}

/// Vertical bars, one per label.
pub fn bar_chart(title: &str, labels: &[String], values: &[u64], y_desc: &str) -> DrawResult<String> {
    let last = (labels.len() as u32).saturating_sub(1);
    let max = values.iter().copied().max().unwrap_or(0).max(1);

    render_svg(SIZE, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 24))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d((0u32..last).into_segmented(), 0u64..max + max / 10 + 1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|v| segment_label(v, labels))
            .y_desc(y_desc)
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.mix(0.7).filled())
                .margin(8)
                .data(values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
        )?;
        Ok(())
    })
}

/// Share of `values` per label. Zero-sized slices are left out.
pub fn pie_chart(title: &str, labels: &[String], values: &[u64]) -> DrawResult<String> {
    let (labels, sizes): (Vec<String>, Vec<f64>) = labels
        .iter()
        .zip(values)
        .filter(|(_, v)| **v > 0)
        .map(|(l, v)| (l.clone(), *v as f64))
        .unzip();
    let colors: Vec<RGBColor> = (0..labels.len()).map(palette).collect();

    render_svg(SIZE, |root| {
        let area = root.titled(title, (FONT, 24))?;
        let (w, h) = area.dim_in_pixel();
        let center = ((w / 2) as i32, (h / 2) as i32);
        let radius = w.min(h) as f64 * 0.35;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.label_style((FONT, 14).into_font().color(&BLACK));
        pie.percentages((FONT, 12).into_font().color(&WHITE));
        area.draw(&pie)?;
        Ok(())
    })
}

/// Movements per day as a filled line.
pub fn daily_area_chart(title: &str, daily: &[DailyCount]) -> DrawResult<String> {
    let first = daily.first().map(|d| d.date).ok_or("no daily data")?;
    let points: Vec<(i32, u32)> = daily
        .iter()
        .map(|d| ((d.date - first).num_days() as i32, d.movements as u32))
        .collect();
    let span = points.last().map(|p| p.0).unwrap_or(0).max(1);
    let max = points.iter().map(|p| p.1).max().unwrap_or(0).max(1);

    render_svg(SIZE, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0i32..span, 0u32..max + 1)?;

        chart
            .configure_mesh()
            .x_label_formatter(&|d| {
                (first + chrono::Duration::days(*d as i64))
                    .format("%d/%m")
                    .to_string()
            })
            .x_desc("Fecha")
            .y_desc("Movimientos")
            .draw()?;

        chart.draw_series(
            AreaSeries::new(points.iter().copied(), 0, BLUE.mix(0.2)).border_style(BLUE),
        )?;
        chart.draw_series(points.iter().map(|p| Circle::new(*p, 3, BLUE.filled())))?;
        Ok(())
    })
}

/// Code number against litres, one colour per style. With `bubble` the marker
/// radius grows with the litres.
pub fn scatter_chart(title: &str, records: &[Movement], bubble: bool) -> DrawResult<String> {
    let mut by_style: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
    for record in records {
        if let Some(code) = record.code_number {
            by_style
                .entry(record.style.as_str())
                .or_default()
                .push((code, record.volume as f64));
        }
    }
    let all: Vec<(f64, f64)> = by_style.values().flatten().copied().collect();
    if all.is_empty() {
        return Err("no numeric identifiers".into());
    }

    let x_min = all.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = all.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let x_pad = ((x_max - x_min) * 0.05).max(1.0);
    let y_max = all.iter().map(|p| p.1).fold(0.0, f64::max).max(1.0);

    render_svg(SIZE, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min - x_pad..x_max + x_pad, 0f64..y_max * 1.2)?;

        chart
            .configure_mesh()
            .x_desc("Código (numérico)")
            .y_desc("Litros")
            .draw()?;

        for (index, (style, points)) in by_style.iter().enumerate() {
            let color = palette(index);
            chart
                .draw_series(points.iter().map(|&(x, y)| {
                    let radius = if bubble {
                        (4.0 + y / y_max * 16.0) as i32
                    } else {
                        4
                    };
                    Circle::new((x, y), radius, color.mix(0.7).filled())
                }))?
                .label(*style)
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    })
}

/// Pre-binned histogram.
pub fn histogram_chart(title: &str, bins: &[HistogramBin]) -> DrawResult<String> {
    let lower = bins.first().map(|b| b.lower).ok_or("no bins")?;
    let upper = bins.last().map(|b| b.upper).unwrap_or(lower + 1.0);
    let max = bins.iter().map(|b| b.count as u32).max().unwrap_or(0).max(1);

    render_svg(SIZE, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(lower..upper, 0u32..max + 1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Litros")
            .y_desc("Barriles")
            .draw()?;

        chart.draw_series(bins.iter().map(|b| {
            let mut bar = Rectangle::new([(b.lower, 0), (b.upper, b.count as u32)], BLUE.mix(0.6).filled());
            bar.set_margin(0, 0, 1, 1);
            bar
        }))?;
        Ok(())
    })
}

/// Litres distribution per group.
pub fn box_chart(title: &str, groups: &[(String, Vec<f64>)]) -> DrawResult<String> {
    let groups: Vec<&(String, Vec<f64>)> = groups.iter().filter(|(_, v)| !v.is_empty()).collect();
    if groups.is_empty() {
        return Err("no groups".into());
    }
    let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
    let quartiles: Vec<Quartiles> = groups.iter().map(|(_, v)| Quartiles::new(v.as_slice())).collect();

    let lo = quartiles.iter().map(|q| q.values()[0]).fold(f32::INFINITY, f32::min);
    let hi = quartiles.iter().map(|q| q.values()[4]).fold(f32::NEG_INFINITY, f32::max);
    let pad = ((hi - lo) * 0.1).max(1.0);
    let last = (labels.len() as u32).saturating_sub(1);

    render_svg(SIZE, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 24))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d((0u32..last).into_segmented(), (lo - pad)..(hi + pad))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|v| segment_label(v, &labels))
            .y_desc("Litros")
            .draw()?;

        chart.draw_series(quartiles.iter().enumerate().map(|(i, q)| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), q)
                .width(24)
                .whisker_width(0.5)
                .style(BLUE)
        }))?;
        Ok(())
    })
}

fn heat_color(value: Option<f64>) -> RGBColor {
    let Some(v) = value else {
        return RGBColor(220, 220, 220);
    };
    let v = v.clamp(-1.0, 1.0);
    let (target, t) = if v < 0.0 {
        ((59.0, 76.0, 192.0), -v)
    } else {
        ((180.0, 4.0, 38.0), v)
    };
    let blend = |c: f64| (255.0 + (c - 255.0) * t).round() as u8;
    RGBColor(blend(target.0), blend(target.1), blend(target.2))
}

/// Annotated correlation matrix.
pub fn heatmap_chart(title: &str, matrix: &CorrelationMatrix) -> DrawResult<String> {
    let k = matrix.columns.len();
    if k == 0 {
        return Err("no numeric columns".into());
    }
    let last = (k as u32).saturating_sub(1);

    render_svg(HEATMAP_SIZE, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..last).into_segmented(), (0u32..last).into_segmented())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(k)
            .y_labels(k)
            .x_label_formatter(&|v| segment_label(v, &matrix.columns))
            .y_label_formatter(&|v| segment_label(v, &matrix.columns))
            .draw()?;

        let cells: Vec<(usize, usize, Option<f64>)> = matrix
            .values
            .iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(move |(col, v)| (col, row, *v))
            })
            .collect();

        chart.draw_series(cells.iter().map(|&(x, y, v)| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(x as u32), SegmentValue::Exact(y as u32)),
                    (segment_edge(x, k), segment_edge(y, k)),
                ],
                heat_color(v).filled(),
            )
        }))?;

        let centered = (FONT, 18)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells.iter().map(|&(x, y, v)| {
            Text::new(
                v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string()),
                (SegmentValue::CenterOf(x as u32), SegmentValue::CenterOf(y as u32)),
                centered.clone(),
            )
        }))?;
        Ok(())
    })
}

/// Collects charts and the notices for the ones that could not be drawn.
struct ChartSet {
    charts: Vec<Chart>,
    notices: Vec<Notice>,
}

impl ChartSet {
    fn fail(&mut self, chart: String, message: String) {
        let err = EtlError::ChartError { chart, message };
        self.notices.push(Notice::warning("charts", err.to_string()));
    }

    fn attempt<F>(&mut self, name: String, title: &str, has_data: bool, draw: F)
    where
        F: FnOnce() -> DrawResult<String>,
    {
        if !has_data {
            self.notices
                .push(Notice::info("charts", format!("{}: sin datos para graficar", title)));
            return;
        }

        match catch_unwind(AssertUnwindSafe(draw)) {
            Ok(Ok(svg)) => {
                tracing::debug!("Chart '{}' rendered ({} bytes)", name, svg.len());
                self.charts.push(Chart {
                    name,
                    title: title.to_string(),
                    svg,
                });
            }
            Ok(Err(e)) => self.fail(name, e.to_string()),
            Err(_) => self.fail(name, "plotting backend panicked".to_string()),
        }
    }
}

fn totals_columns(totals: &[GroupTotal]) -> (Vec<String>, Vec<u64>, Vec<u64>) {
    let labels = totals.iter().map(|t| t.group.clone()).collect();
    let volumes = totals.iter().map(|t| t.volume).collect();
    let units = totals.iter().map(|t| t.units as u64).collect();
    (labels, volumes, units)
}

/// Draws every dashboard chart for `report`.
pub fn render_charts(report: &InventoryReport) -> (Vec<Chart>, Vec<Notice>) {
    let mut set = ChartSet {
        charts: Vec::new(),
        notices: Vec::new(),
    };

    let (labels, volumes, _) = totals_columns(&report.volume_by_style);
    set.attempt(
        "volume_by_style".to_string(),
        "Litros por estilo (inventario actual)",
        !labels.is_empty(),
        || bar_chart("Litros por estilo", &labels, &volumes, "Litros"),
    );

    let status_labels: Vec<String> = report.status_counts.iter().map(|s| s.status.clone()).collect();
    let status_units: Vec<u64> = report.status_counts.iter().map(|s| s.units as u64).collect();
    set.attempt(
        "units_by_status".to_string(),
        "Barriles por estado",
        !status_labels.is_empty(),
        || bar_chart("Barriles por estado", &status_labels, &status_units, "Barriles"),
    );

    for summary in &report.views {
        let view_slug = slug(&summary.view.name);
        let (labels, volumes, _) = totals_columns(&summary.totals);
        let bar_title = format!("{}: litros por {}", summary.view.name, summary.view.group_by.label().to_lowercase());
        set.attempt(
            format!("view_{}_bar", view_slug),
            &bar_title,
            !labels.is_empty(),
            || bar_chart(&bar_title, &labels, &volumes, "Litros"),
        );
        let pie_title = format!("{}: distribución", summary.view.name);
        set.attempt(
            format!("view_{}_pie", view_slug),
            &pie_title,
            summary.total_volume > 0,
            || pie_chart(&pie_title, &labels, &volumes),
        );
    }

    set.attempt(
        "daily_movements".to_string(),
        "Inventario diario (movimientos por día)",
        !report.daily_movements.is_empty(),
        || daily_area_chart("Movimientos por día", &report.daily_movements),
    );

    let has_codes = report.current.iter().any(|m| m.code_number.is_some());
    set.attempt(
        "code_vs_volume_scatter".to_string(),
        "Código numérico vs litros",
        has_codes,
        || scatter_chart("Código numérico vs litros", &report.current, false),
    );

    set.attempt(
        "volume_histogram".to_string(),
        "Histograma de litros",
        !report.volume_histogram.is_empty(),
        || histogram_chart("Histograma de litros", &report.volume_histogram),
    );

    let mut by_style: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in &report.current {
        by_style
            .entry(record.style.as_str())
            .or_default()
            .push(record.volume as f64);
    }
    let groups: Vec<(String, Vec<f64>)> = by_style
        .into_iter()
        .map(|(style, values)| (style.to_string(), values))
        .collect();
    set.attempt(
        "volume_by_style_box".to_string(),
        "Distribución de litros por estilo",
        !groups.is_empty(),
        || box_chart("Litros por estilo", &groups),
    );

    set.attempt(
        "correlation_heatmap".to_string(),
        "Correlación de columnas numéricas",
        !report.current.is_empty(),
        || heatmap_chart("Correlación", &report.correlation),
    );

    set.attempt(
        "code_vs_volume_bubble".to_string(),
        "Burbujas: código numérico vs litros",
        has_codes,
        || scatter_chart("Código numérico vs litros", &report.current, true),
    );

    (set.charts, set.notices)
}
