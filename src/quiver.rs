//! # Quiver Maps
//!
//! Vector fields (currents) drawn as arrows on a subsampled grid, with a
//! reference arrow (quiver key) below the map.
//!
//! Arrow lengths follow the usual autoscaling rule: the mean arrow is
//! `1 / (1.8 * max(10, sqrt(n)))` of the axes width, where `n` is the number
//! of arrows drawn.

use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use ndarray::Array2;

use crate::canvas::{self, BLACK, HAlign, LIGHT_GRAY, VAlign};
use crate::config::{DEFAULT_KEY_UNITS, RenderConfig};
use crate::dataset::VectorField;
use crate::error::{ClimfigError, Result};
use crate::map::{LABEL_PT, MapFigure, Projection, format_number, resolve_extent};
use crate::pcolor::paint_grid;

/// Shaft width as a fraction of the axes width
const SHAFT_WIDTH: f32 = 0.005;
const HEAD_LENGTH: f32 = 4.5;
const HEAD_HALF_WIDTH: f32 = 1.5;
/// Quiver key position in axes fractions
const KEY_POSITION: (f32, f32) = (0.55, -0.08);

/// One arrow to draw, in lon/lat and data units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub lon: f64,
    pub lat: f64,
    pub u: f64,
    pub v: f64,
}

/// Arrows of every `step`-th grid point in both directions, skipping masked vectors
pub fn subsample(field: &VectorField, step: usize) -> Vec<Arrow> {
    let step = step.max(1);
    let mut arrows = Vec::new();
    for (j, &lat) in field.lat.iter().enumerate().step_by(step) {
        for (i, &lon) in field.lon.iter().enumerate().step_by(step) {
            let (u, v) = (field.u[[j, i]], field.v[[j, i]]);
            if u.is_finite() && v.is_finite() {
                arrows.push(Arrow { lon, lat, u, v });
            }
        }
    }
    arrows
}

/// Pixels per data unit for arrows drawn in axes `axes_width` pixels wide;
/// `None` when there is nothing to scale.
pub fn arrow_scale(arrows: &[Arrow], axes_width: f32) -> Option<f64> {
    if arrows.is_empty() {
        return None;
    }
    let n = arrows.len() as f64;
    let mean = arrows.iter().map(|a| a.u.hypot(a.v)).sum::<f64>() / n;
    if !(mean > 0.0) {
        return None;
    }
    let sn = n.sqrt().max(10.0);
    Some(axes_width as f64 / (1.8 * sn * mean))
}

/// Reference arrow length: half the rounded maximum speed, or half the maximum
/// speed rounded to one significant digit for slow fields.
pub fn default_key_size(max_speed: f64) -> f64 {
    let key = max_speed.round() / 2.0;
    if key > 0.0 {
        return key;
    }
    let half = max_speed / 2.0;
    if !(half > 0.0) {
        return 0.0;
    }
    let magnitude = 10f64.powf(half.log10().floor());
    (half / magnitude).round() * magnitude
}

/// Arrow with a triangular head, starting at `tail`
pub fn draw_arrow(img: &mut RgbaImage, tail: (f32, f32), delta: (f32, f32), shaft: f32, color: Rgba<u8>) {
    let len = delta.0.hypot(delta.1);
    if len < 0.5 {
        return;
    }
    let (ux, uy) = (delta.0 / len, delta.1 / len);
    let (nx, ny) = (-uy, ux);
    let head_len = (HEAD_LENGTH * shaft).min(len);
    let half = HEAD_HALF_WIDTH * shaft;
    let tip = (tail.0 + delta.0, tail.1 + delta.1);
    let base = (tip.0 - ux * head_len, tip.1 - uy * head_len);

    if len > head_len {
        canvas::line(img, tail, base, shaft, color);
    }
    canvas::fill_polygon(
        img,
        &[
            tip,
            (base.0 + nx * half, base.1 + ny * half),
            (base.0 - nx * half, base.1 - ny * half),
        ],
        color,
    );
}

/// Renders a vector field as a quiver map.
///
/// Cells where the field is masked are drawn in the land color.
pub fn map_quiver(
    field: &VectorField,
    title: &str,
    annotation: Option<&str>,
    config: &RenderConfig,
    font: Option<FontArc>,
) -> Result<RgbaImage> {
    let shape = (field.lat.len(), field.lon.len());
    if field.u.dim() != shape || field.v.dim() != shape {
        return Err(ClimfigError::InvalidShape(format!(
            "u is {:?} and v is {:?} but the grid is {:?}",
            field.u.dim(),
            field.v.dim(),
            shape
        )));
    }
    let extent = resolve_extent(config.extent, &field.lon, &field.lat)?;
    let mut fig = MapFigure::new(config, extent, None, font);

    let speed = field.speed();
    paint_mask(&mut fig.layer, &fig.projection, field, &speed);
    fig.draw_features(config);

    let arrows = subsample(field, config.quiver.slice_interval);
    let shaft = (SHAFT_WIDTH * fig.axes.w).max(1.0);
    let scale = arrow_scale(&arrows, fig.axes.w);
    match scale {
        Some(scale) => {
            debug!("quiver {}: {} arrows, {:.2} px per unit", title, arrows.len(), scale);
            for a in &arrows {
                let tail = fig.projection.project(a.lon, a.lat);
                let delta = ((a.u * scale) as f32, (-a.v * scale) as f32);
                draw_arrow(&mut fig.layer, tail, delta, shaft, BLACK);
            }
        }
        None => warn!("No non-zero vectors to draw for {}", title),
    }

    fig.decorate(config, &field.lon, &field.lat, title, annotation);

    if let Some(scale) = scale {
        let max_speed = crate::dataset::finite_range(speed.iter().copied())
            .map(|(_, hi)| hi)
            .unwrap_or(0.0);
        let key = config
            .quiver
            .key_size
            .unwrap_or_else(|| default_key_size(max_speed));
        if key > 0.0 {
            let label = key_label(key, &key_units(field, config));
            draw_key(&mut fig, key, scale, shaft, &label);
        }
    }
    Ok(fig.into_image())
}

/// Paints the cells where the vector field is masked in light gray
pub(crate) fn paint_mask(layer: &mut RgbaImage, proj: &Projection, field: &VectorField, speed: &Array2<f64>) {
    paint_grid(layer, proj, &field.lon, &field.lat, |j, i| {
        speed[[j, i]].is_nan().then_some(LIGHT_GRAY)
    });
}

/// Units of the quiver key: configured, else those of the data
pub fn key_units(field: &VectorField, config: &RenderConfig) -> String {
    config
        .quiver
        .key_units
        .clone()
        .or_else(|| field.units.clone())
        .unwrap_or_else(|| DEFAULT_KEY_UNITS.to_string())
}

pub fn key_label(key: f64, units: &str) -> String {
    format!("({} {})", format_number(key, 3), units)
}

/// Reference arrow of length `key` below the axes, label to its west
pub(crate) fn draw_key(fig: &mut MapFigure, key: f64, scale: f64, shaft: f32, label: &str) {
    let (x, y) = fig.axes_point(KEY_POSITION.0, KEY_POSITION.1);
    draw_arrow(&mut fig.canvas.img, (x, y), ((key * scale) as f32, 0.0), shaft, BLACK);
    let sep = fig.canvas.pt(7.2);
    fig.canvas
        .text(label, x - sep, y, LABEL_PT, HAlign::Right, VAlign::Middle);
}
