//! SVG charts of the dashboard's year × country table.
//!
//! - One series per country, as lines (with markers) or grouped bars
//! - Distinct series colors (Microsoft Office palette)
//! - Absolute values share one scale (thousands … trillions); indexed values are plotted as is

use crate::models::{ChartKind, DisplayMode};
use crate::transform::ChartData;
use anyhow::{Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_svg::SVGBackend;
use std::path::Path;

/// Microsoft Office (2013+) chart series palette.
const OFFICE10: [RGBColor; 10] = [
    RGBColor(68, 114, 196),  // blue      (#4472C4)
    RGBColor(237, 125, 49),  // orange    (#ED7D31)
    RGBColor(165, 165, 165), // gray      (#A5A5A5)
    RGBColor(255, 192, 0),   // gold      (#FFC000)
    RGBColor(91, 155, 213),  // light blue(#5B9BD5)
    RGBColor(112, 173, 71),  // green     (#70AD47)
    RGBColor(38, 68, 120),   // dark blue (#264478)
    RGBColor(158, 72, 14),   // dark org. (#9E480E)
    RGBColor(99, 99, 99),    // dark gray (#636363)
    RGBColor(153, 115, 0),   // brownish  (#997300)
];

#[inline]
pub fn office_color(idx: usize) -> RGBColor {
    OFFICE10[idx % OFFICE10.len()]
}

/// Pick a single Y-axis scale and its human label based on the overall magnitude.
/// Returns (scale, label), e.g. (1e9, "billions").
pub fn choose_axis_scale(max_abs: f64) -> (f64, &'static str) {
    if max_abs >= 1.0e12 {
        (1.0e12, "trillions")
    } else if max_abs >= 1.0e9 {
        (1.0e9, "billions")
    } else if max_abs >= 1.0e6 {
        (1.0e6, "millions")
    } else if max_abs >= 1.0e3 {
        (1.0e3, "thousands")
    } else {
        (1.0, "")
    }
}

/// Render `chart` to an SVG file.
pub fn render_svg<P: AsRef<Path>>(
    chart: &ChartData,
    kind: ChartKind,
    out_path: P,
    width: u32,
    height: u32,
    title: &str,
) -> Result<()> {
    if chart.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let root = SVGBackend::new(out_path.as_ref(), (width, height)).into_drawing_area();
    draw_chart(root, chart, kind, title)
}

/// Render `chart` to an in-memory SVG document.
pub fn render_svg_string(
    chart: &ChartData,
    kind: ChartKind,
    width: u32,
    height: u32,
    title: &str,
) -> Result<String> {
    if chart.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (width, height)).into_drawing_area();
        draw_chart(root, chart, kind, title)?;
    }
    Ok(buf)
}

/// Y range covering every value (and zero for bars), with a little headroom.
fn y_bounds(lo: f64, hi: f64, kind: ChartKind) -> (f64, f64) {
    let (mut lo, mut hi) = match kind {
        ChartKind::Bar => (lo.min(0.0), hi.max(0.0)),
        ChartKind::Line => (lo, hi),
    };
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.05;
    let lo = if kind == ChartKind::Bar && lo == 0.0 { 0.0 } else { lo - pad };
    (lo, hi + pad)
}

/// Helper that draws to any Plotters backend.
fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    chart: &ChartData,
    kind: ChartKind,
    title: &str,
) -> Result<()>
where
    DB: DrawingBackend,
{
    let (min_val, max_val) = chart
        .value_bounds()
        .ok_or_else(|| anyhow!("no numeric values to plot"))?;
    let (scale, y_desc) = match chart.mode {
        DisplayMode::Index => (1.0, "Index (first year = 100)".to_string()),
        DisplayMode::Absolute => {
            let (scale, label) = choose_axis_scale(min_val.abs().max(max_val.abs()));
            if label.is_empty() {
                (scale, "GDP (US$)".to_string())
            } else {
                (scale, format!("GDP (US$, {label})"))
            }
        }
    };
    let (y0, y1) = y_bounds(min_val / scale, max_val / scale, kind);

    let first_year = *chart.years.first().ok_or_else(|| anyhow!("no years to plot"))?;
    let last_year = *chart.years.last().ok_or_else(|| anyhow!("no years to plot"))?;
    let (x0, x1) = (f64::from(first_year) - 0.5, f64::from(last_year) + 0.5);

    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let mut ctx = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 44)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(|e| anyhow!("{:?}", e))?;

    // Only whole years get a tick label.
    let x_label_fmt = |x: &f64| {
        if (x - x.round()).abs() < 1e-9 {
            format!("{:.0}", x)
        } else {
            String::new()
        }
    };
    let y_label_fmt = |v: &f64| {
        let a = v.abs();
        let prec = if a >= 100.0 {
            0
        } else if a >= 10.0 {
            1
        } else {
            2
        };
        format!("{:.*}", prec, v)
    };
    let x_label_count = ((last_year - first_year + 1) as usize).min(12);

    ctx.configure_mesh()
        .x_desc("Year")
        .y_desc(y_desc)
        .x_labels(x_label_count)
        .y_labels(10)
        .x_label_formatter(&x_label_fmt)
        .y_label_formatter(&y_label_fmt)
        .label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    let n = chart.columns.len();
    let bar_width = 0.8 / n as f64;
    for (idx, column) in chart.columns.iter().enumerate() {
        let color = office_color(idx);
        let pts: Vec<(f64, f64)> = chart
            .years
            .iter()
            .zip(&column.values)
            .filter_map(|(y, v)| v.map(|v| (f64::from(*y), v / scale)))
            .collect();

        match kind {
            ChartKind::Line => {
                ctx.draw_series(LineSeries::new(pts, color.stroke_width(2)).point_size(3))
                    .map_err(|e| anyhow!("{:?}", e))?
                    .label(column.country.clone())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 24, y)], color.stroke_width(2))
                    });
            }
            ChartKind::Bar => {
                let offset = -0.4 + idx as f64 * bar_width;
                let bars = pts.into_iter().map(|(x, v)| {
                    let left = x + offset;
                    Rectangle::new([(left, 0.0), (left + bar_width, v)], color.filled())
                });
                ctx.draw_series(bars)
                    .map_err(|e| anyhow!("{:?}", e))?
                    .label(column.country.clone())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                    });
            }
        }
    }

    ctx.configure_series_labels()
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .label_font(("sans-serif", 14))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
