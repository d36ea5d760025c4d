use crate::domain::model::ReportStatistics;
use crate::utils::error::{EtlError, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{Palette, Palette99};
use std::f64::consts::PI;

pub const WIDTH: u32 = 1600;
pub const HEIGHT: u32 = 900;
pub const OTHER_SLICE: &str = "Other";

const FONT: &str = "sans-serif";

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Renders the four report charts as one 2x2 PNG.
///
/// Text needs a system font. When the font backend fails the panels are
/// drawn again without captions, axis labels or legends.
pub async fn render_png(stats: &ReportStatistics) -> Result<Vec<u8>> {
    let labelled = stats.clone();
    match tokio::task::spawn_blocking(move || draw_png(&labelled, true)).await {
        Ok(Ok(png)) => return Ok(png),
        Ok(Err(e)) => tracing::warn!("⚠️ Chart text could not be drawn, retrying without labels: {}", e),
        Err(e) => tracing::warn!("⚠️ Font backend aborted, retrying without labels: {}", e),
    }

    let plain = stats.clone();
    tokio::task::spawn_blocking(move || draw_png(&plain, false))
        .await
        .map_err(|e| EtlError::TaskFailed {
            message: format!("chart rendering: {}", e),
        })?
}

/// Draws the panels into an RGB buffer and encodes it as PNG.
pub fn draw_png(stats: &ReportStatistics, labels: bool) -> Result<Vec<u8>> {
    let mut pixels = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (WIDTH, HEIGHT)).into_drawing_area();
        draw_panels(&root, stats, labels).map_err(chart_error)?;
        root.present().map_err(chart_error)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, WIDTH, HEIGHT, ExtendedColorType::Rgb8)
        .map_err(chart_error)?;
    Ok(png)
}

fn chart_error(e: impl std::fmt::Display) -> EtlError {
    EtlError::RenderError {
        message: format!("chart drawing failed: {}", e),
    }
}

fn draw_panels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    stats: &ReportStatistics,
    labels: bool,
) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));
    let years: Vec<i32> = stats.years().collect();

    grouped_bars(
        &panels[0],
        "Salary level by year",
        &years,
        &[
            ("Average salary".to_string(), values(&stats.salary_by_year)),
            (
                format!("Salary - {}", stats.profession),
                values(&stats.salary_filtered_by_year),
            ),
        ],
        labels,
    )?;
    grouped_bars(
        &panels[1],
        "Vacancy count by year",
        &years,
        &[
            ("Vacancy count".to_string(), counts(&stats.count_by_year)),
            (
                format!("Vacancy count - {}", stats.profession),
                counts(&stats.count_filtered_by_year),
            ),
        ],
        labels,
    )?;

    let salary_bars: Vec<(String, f64)> = stats
        .salary_by_area
        .iter()
        .map(|a| (a.area.clone(), a.mean_salary))
        .collect();
    horizontal_bars(&panels[2], "Salary level by city", &salary_bars, labels)?;
    pie(&panels[3], "Vacancy share by city", &pie_slices(stats), labels)
}

/// Shown shares plus the synthesized remainder.
pub fn pie_slices(stats: &ReportStatistics) -> Vec<(String, f64)> {
    let mut slices: Vec<(String, f64)> = stats
        .share_by_area
        .iter()
        .map(|a| (a.area.clone(), a.share))
        .collect();
    let shown: f64 = slices.iter().map(|(_, share)| share).sum();
    slices.push((OTHER_SLICE.to_string(), (1.0 - shown).max(0.0)));
    slices
}

fn values(series: &[(i32, f64)]) -> Vec<f64> {
    series.iter().map(|(_, v)| *v).collect()
}

fn counts(series: &[(i32, usize)]) -> Vec<f64> {
    series.iter().map(|(_, v)| *v as f64).collect()
}

fn axis_top(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// 刻度位置四捨五入成索引，超出範圍的刻度不標示
fn slot_label<T: ToString>(items: &[T], position: f64) -> String {
    let index = position.round();
    if index < 0.0 {
        return String::new();
    }
    items
        .get(index as usize)
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn grouped_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    heading: &str,
    years: &[i32],
    series: &[(String, Vec<f64>); 2],
    labels: bool,
) -> DrawResult<DB> {
    let max = series
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .fold(0.0_f64, f64::max);
    let slots = years.len().max(1) as f64;

    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if labels {
        builder
            .caption(heading, (FONT, 20).into_font())
            .x_label_area_size(40)
            .y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(-0.5..slots - 0.5, 0.0..axis_top(max))?;

    if labels {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(years.len().max(1))
            .x_label_formatter(&|x| slot_label(years, *x))
            .draw()?;
    }

    for (s, (name, values)) in series.iter().enumerate() {
        let color = Palette99::pick(s).to_rgba();
        let offset = if s == 0 { -0.4 } else { 0.0 };
        let drawn = chart.draw_series(values.iter().enumerate().map(move |(i, v)| {
            let left = i as f64 + offset;
            Rectangle::new([(left, 0.0), (left + 0.4, *v)], color.filled())
        }))?;
        if labels {
            drawn
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if labels {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    Ok(())
}

fn horizontal_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    heading: &str,
    bars: &[(String, f64)],
    labels: bool,
) -> DrawResult<DB> {
    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let slots = bars.len().max(1) as f64;
    // 第一名畫在最上方
    let names: Vec<&str> = bars.iter().rev().map(|(name, _)| name.as_str()).collect();

    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if labels {
        builder
            .caption(heading, (FONT, 20).into_font())
            .x_label_area_size(30)
            .y_label_area_size(140);
    }
    let mut chart = builder.build_cartesian_2d(0.0..axis_top(max), -0.5..slots - 0.5)?;

    if labels {
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(bars.len().max(1))
            .y_label_formatter(&|y| slot_label(&names, *y))
            .draw()?;
    }

    let color = Palette99::pick(0).to_rgba();
    let top = bars.len().saturating_sub(1) as f64;
    chart.draw_series(bars.iter().enumerate().map(move |(i, (_, v))| {
        let center = top - i as f64;
        Rectangle::new([(0.0, center - 0.4), (*v, center + 0.4)], color.filled())
    }))?;
    Ok(())
}

fn pie<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    heading: &str,
    slices: &[(String, f64)],
    labels: bool,
) -> DrawResult<DB> {
    let titled;
    let area = if labels {
        titled = area.titled(heading, (FONT, 20).into_font())?;
        &titled
    } else {
        area
    };

    let total: f64 = slices.iter().map(|(_, v)| *v).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let (width, height) = area.dim_in_pixel();
    let cx = f64::from(width) / 2.0;
    let cy = f64::from(height) / 2.0;
    let radius = (f64::from(width.min(height)) / 2.0 - 40.0).max(10.0);

    let mut angle = -PI / 2.0;
    for (i, (label, value)) in slices.iter().enumerate() {
        let fraction = value / total;
        if fraction <= 0.0 {
            continue;
        }
        let end = angle + fraction * 2.0 * PI;

        // 扇形以折線逼近圓弧
        let steps = ((end - angle) / 0.02).ceil().max(1.0) as usize;
        let mut points = vec![(cx as i32, cy as i32)];
        for step in 0..=steps {
            let theta = angle + (end - angle) * step as f64 / steps as f64;
            points.push((
                (cx + radius * theta.cos()) as i32,
                (cy + radius * theta.sin()) as i32,
            ));
        }
        area.draw(&Polygon::new(points, Palette99::pick(i).filled()))?;

        if labels {
            let middle = (angle + end) / 2.0;
            let x = cx + (radius + 12.0) * middle.cos();
            let y = cy + (radius + 12.0) * middle.sin();
            area.draw(&Text::new(
                label.clone(),
                (x as i32, y as i32),
                (FONT, 12).into_font(),
            ))?;
        }
        angle = end;
    }
    Ok(())
}
