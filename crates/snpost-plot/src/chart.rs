//! Chart rendering on the plotters bitmap backend.

use std::path::Path;

use plotters::prelude::*;

use crate::error::{Error, Result};

const FIGURE_SIZE: (u32, u32) = (800, 500);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 22);

/// One curve on a chart: x/y samples plus an optional legend label.
#[derive(Debug, Clone)]
pub struct Curve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub label: Option<String>,
}

impl Curve {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y, label: None }
    }

    pub fn with_label(x: Vec<f64>, y: Vec<f64>, label: impl Into<String>) -> Self {
        Self {
            x,
            y,
            label: Some(label.into()),
        }
    }

    fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

fn backend<E: std::fmt::Display>(e: E) -> Error {
    Error::Backend(e.to_string())
}

/// Positive finite bounds for a log axis, with a fallback for empty input.
fn log_bounds(values: impl Iterator<Item = f64>, default: (f64, f64)) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite() && *v > 0.0) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return default;
    }
    if lo == hi {
        (lo / 2.0, hi * 2.0)
    } else {
        (lo, hi)
    }
}

/// Finite bounds for a linear axis, padded so flat curves stay visible.
fn linear_bounds(values: impl Iterator<Item = f64>, default: (f64, f64)) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return default;
    }
    if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    }
}

/// Plot impedance magnitude versus frequency, both axes logarithmic.
///
/// `x` is frequency in GHz, `y` is |Z| in ohms. Points with non-positive
/// coordinates (the DC sample in particular) are dropped, as a log axis
/// cannot represent them.
pub fn plot_impedance_magnitude(curves: &[Curve], title: &str, out_path: &Path) -> Result<()> {
    let (x_lo, x_hi) = log_bounds(curves.iter().flat_map(|c| c.x.iter().copied()), (1e-6, 10.0));
    let (y_lo, y_hi) = log_bounds(
        curves.iter().flat_map(|c| c.y.iter().copied()),
        (1e-3, 1e2),
    );

    let root = BitMapBackend::new(out_path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(backend)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(56)
        .build_cartesian_2d((x_lo..x_hi).log_scale(), (y_lo..y_hi).log_scale())
        .map_err(backend)?;
    chart
        .configure_mesh()
        .x_desc("Frequency (GHz)")
        .y_desc("Z (Ohm)")
        .draw()
        .map_err(backend)?;

    let mut any_label = false;
    for (idx, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let series = chart
            .draw_series(LineSeries::new(
                curve.points().filter(|&(x, y)| x > 0.0 && y > 0.0),
                color,
            ))
            .map_err(backend)?;
        if let Some(label) = &curve.label {
            any_label = true;
            series
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color));
        }
    }
    if any_label {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(backend)?;
    }
    root.present().map_err(backend)?;
    Ok(())
}

/// Plot S-parameter magnitude in dB versus frequency, both axes linear.
///
/// `x` is frequency in GHz, `y` is magnitude in dB.
pub fn plot_s_parameter_db(curves: &[Curve], title: &str, out_path: &Path) -> Result<()> {
    let (x_lo, x_hi) =
        linear_bounds(curves.iter().flat_map(|c| c.x.iter().copied()), (0.0, 10.0));
    let (y_lo, y_hi) = linear_bounds(
        curves.iter().flat_map(|c| c.y.iter().copied()),
        (-60.0, 0.0),
    );

    let root = BitMapBackend::new(out_path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(backend)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(56)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(backend)?;
    chart
        .configure_mesh()
        .x_desc("Frequency (GHz)")
        .y_desc("S (dB)")
        .draw()
        .map_err(backend)?;

    let mut any_label = false;
    for (idx, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let series = chart
            .draw_series(LineSeries::new(curve.points(), color))
            .map_err(backend)?;
        if let Some(label) = &curve.label {
            any_label = true;
            series
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color));
        }
    }
    if any_label {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(backend)?;
    }
    root.present().map_err(backend)?;
    Ok(())
}

/// Plot time-domain step responses.
///
/// `x` is time in nanoseconds, `y` is impedance in ohms.
pub fn plot_time_domain_step(curves: &[Curve], title: &str, out_path: &Path) -> Result<()> {
    let (x_lo, x_hi) =
        linear_bounds(curves.iter().flat_map(|c| c.x.iter().copied()), (0.0, 10.0));
    let (y_lo, y_hi) = linear_bounds(
        curves.iter().flat_map(|c| c.y.iter().copied()),
        (0.0, 100.0),
    );

    let root = BitMapBackend::new(out_path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(backend)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(56)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(backend)?;
    chart
        .configure_mesh()
        .x_desc("Time (ns)")
        .y_desc("Zc (Ohm)")
        .draw()
        .map_err(backend)?;

    let mut any_label = false;
    for (idx, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let series = chart
            .draw_series(LineSeries::new(curve.points(), color))
            .map_err(backend)?;
        if let Some(label) = &curve.label {
            any_label = true;
            series
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color));
        }
    }
    if any_label {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(backend)?;
    }
    root.present().map_err(backend)?;
    Ok(())
}
