//! # Map Layout
//!
//! Geometry shared by the pcolor and quiver renderers: the page layout, the
//! equirectangular (PlateCarree) projection of the axes, graticule ticks and
//! labels, the title, the in-axes annotation and the colorbar.
//!
//! Data is drawn on a separate axes layer so that anything falling outside the
//! map extent is clipped; the layer is copied onto the page by
//! [`MapFigure::finish_axes`].

use ab_glyph::FontArc;
use image::RgbaImage;

use crate::canvas::{BLACK, Canvas, HAlign, Rect, VAlign, WHITE};
use crate::colormap::{Colormap, Normalization};
use crate::config::{ColorbarOrientation, RenderConfig};
use crate::error::{ClimfigError, Result};
use crate::features;

pub const TITLE_PT: f32 = 12.0;
pub const LABEL_PT: f32 = 10.0;
const TICK_LEN_PT: f32 = 3.5;
const TICK_PAD_PT: f32 = 3.5;
const FRAME_PT: f32 = 0.8;
/// Padding kept around the content when the figure is cropped (0.1 in)
const TIGHT_PAD_PT: f32 = 7.2;
const COLORBAR_TICKS: usize = 7;

/// Equirectangular projection of an extent onto a pixel grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// `[lon_min, lon_max, lat_min, lat_max]`
    pub extent: [f64; 4],
    pub width: f32,
    pub height: f32,
}

impl Projection {
    pub fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        let [lon0, lon1, lat0, lat1] = self.extent;
        let x = (lon - lon0) / (lon1 - lon0) * self.width as f64;
        let y = (lat1 - lat) / (lat1 - lat0) * self.height as f64;
        (x as f32, y as f32)
    }

    /// Longitude at the center of pixel column `px`
    pub fn lon_at(&self, px: u32) -> f64 {
        let [lon0, lon1, ..] = self.extent;
        lon0 + (px as f64 + 0.5) / self.width as f64 * (lon1 - lon0)
    }

    /// Latitude at the center of pixel row `py`
    pub fn lat_at(&self, py: u32) -> f64 {
        let [.., lat0, lat1] = self.extent;
        lat1 - (py as f64 + 0.5) / self.height as f64 * (lat1 - lat0)
    }

    /// Whether a lon/lat bounding box `[lon_min, lon_max, lat_min, lat_max]` overlaps the extent
    pub fn intersects(&self, bbox: [f64; 4]) -> bool {
        let [lon0, lon1, lat0, lat1] = self.extent;
        bbox[0] <= lon1 && bbox[1] >= lon0 && bbox[2] <= lat1 && bbox[3] >= lat0
    }
}

/// Map extent: the configured one, or the bounds of the grid
pub fn resolve_extent(configured: Option<[f64; 4]>, lon: &[f64], lat: &[f64]) -> Result<[f64; 4]> {
    if let Some(extent) = configured {
        return Ok(extent);
    }
    let bounds = |v: &[f64], axis: &str| -> Result<(f64, f64)> {
        let (lo, hi) = crate::dataset::finite_range(v.iter().copied())
            .ok_or_else(|| ClimfigError::InvalidShape(format!("empty {} axis", axis)))?;
        if lo == hi {
            return Err(ClimfigError::InvalidShape(format!(
                "{} axis has a single value, set an explicit extent",
                axis
            )));
        }
        Ok((lo, hi))
    };
    let (lon0, lon1) = bounds(lon, "longitude")?;
    let (lat0, lat1) = bounds(lat, "latitude")?;
    Ok([lon0, lon1, lat0, lat1])
}

/// Index of the grid cell containing `x`.
///
/// `coords` are cell centers in increasing or decreasing order; cell edges
/// are the midpoints between neighbours and the outer cells extend half a
/// spacing beyond the first and last centers.
pub fn cell_lookup(coords: &[f64], x: f64) -> Option<usize> {
    let n = coords.len();
    if n == 0 || !x.is_finite() {
        return None;
    }
    if n == 1 {
        return Some(0);
    }
    let descending = coords[0] > coords[n - 1];
    let key = |i: usize| if descending { -coords[i] } else { coords[i] };
    let x = if descending { -x } else { x };

    let lower = key(0) - (key(1) - key(0)) / 2.0;
    let upper = key(n - 1) + (key(n - 1) - key(n - 2)) / 2.0;
    if x < lower || x > upper {
        return None;
    }
    // first cell whose upper edge lies at or beyond x
    let (mut lo, mut hi) = (0, n - 1);
    while lo < hi {
        let mid = (lo + hi) / 2;
        let edge = (key(mid) + key(mid + 1)) / 2.0;
        if x <= edge {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Some(lo)
}

pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![lo],
        _ => (0..n).map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64).collect(),
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Graticule ticks of one axis: the explicit list when given, otherwise
/// `bins` values evenly spread over the coordinates and rounded to `decimals`.
/// Only ticks inside `[lo, hi]` are kept.
pub fn axis_ticks(
    explicit: Option<&[f64]>,
    coords: &[f64],
    bins: usize,
    decimals: i32,
    lo: f64,
    hi: f64,
) -> Vec<f64> {
    let candidates = match explicit {
        Some(ticks) => ticks.to_vec(),
        None => match crate::dataset::finite_range(coords.iter().copied()) {
            Some((cmin, cmax)) => linspace(cmin, cmax, bins)
                .into_iter()
                .map(|t| round_to(t, decimals))
                .collect(),
            None => vec![],
        },
    };
    let eps = (hi - lo).abs() * 1e-9;
    candidates
        .into_iter()
        .filter(|t| *t >= lo - eps && *t <= hi + eps)
        .collect()
}

/// Shortest decimal rendering of `value` with at most `max_decimals` decimals
pub fn format_number(value: f64, max_decimals: usize) -> String {
    let s = format!("{:.*}", max_decimals, value);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    };
    if s == "-0" { "0".to_string() } else { s }
}

fn format_degrees(value: f64, decimals: i32, negative: char, positive: char) -> String {
    let digits = format_number(value.abs(), decimals.max(0) as usize);
    if digits == "0" {
        return "0°".to_string();
    }
    let hemisphere = if value < 0.0 { negative } else { positive };
    format!("{}°{}", digits, hemisphere)
}

pub fn format_lon(value: f64, decimals: i32) -> String {
    if (value.abs() - 180.0).abs() < 1e-9 {
        return "180°".to_string();
    }
    format_degrees(value, decimals, 'W', 'E')
}

pub fn format_lat(value: f64, decimals: i32) -> String {
    format_degrees(value, decimals, 'S', 'N')
}

/// A map page under construction
pub struct MapFigure {
    pub canvas: Canvas,
    /// Axes rectangle in page pixels
    pub axes: Rect,
    pub projection: Projection,
    /// Axes content, clipped to the axes rectangle
    pub layer: RgbaImage,
    colorbar: Option<(Rect, ColorbarOrientation)>,
    tick_decimals: i32,
}

impl MapFigure {
    /// Lays out the page for `extent`, reserving room for a colorbar when
    /// `colorbar` is set.
    pub fn new(
        config: &RenderConfig,
        extent: [f64; 4],
        colorbar: Option<ColorbarOrientation>,
        font: Option<FontArc>,
    ) -> Self {
        let (w, h) = config.pixel_size();
        let canvas = Canvas::new(w, h, config.dpi, font);
        let (w, h) = (w as f32, h as f32);
        let avail = Rect {
            x: 0.125 * w,
            y: 0.12 * h,
            w: 0.775 * w,
            h: 0.77 * h,
        };

        let mut area = avail;
        match colorbar {
            Some(ColorbarOrientation::Horizontal) => area.h *= 0.80,
            Some(ColorbarOrientation::Vertical) => area.w *= 0.82,
            None => area.h *= 0.90,
        }
        let axes = fit_aspect(area, extent);

        let colorbar = colorbar.map(|orientation| {
            let rect = match orientation {
                ColorbarOrientation::Horizontal => Rect {
                    x: axes.x,
                    y: axes.bottom() + 0.08 * axes.h,
                    w: axes.w,
                    h: 0.04 * axes.h.max(axes.w),
                },
                ColorbarOrientation::Vertical => Rect {
                    x: axes.right() + canvas.pt(7.2),
                    y: axes.y,
                    w: 0.05 * axes.w,
                    h: axes.h,
                },
            };
            (rect, orientation)
        });

        let layer_w = axes.w.round().max(1.0) as u32;
        let layer_h = axes.h.round().max(1.0) as u32;
        MapFigure {
            canvas,
            axes,
            projection: Projection {
                extent,
                width: layer_w as f32,
                height: layer_h as f32,
            },
            layer: RgbaImage::from_pixel(layer_w, layer_h, WHITE),
            colorbar,
            tick_decimals: config.tick_decimals,
        }
    }

    /// Page coordinates of a point given in axes fractions (origin bottom left)
    pub fn axes_point(&self, fx: f32, fy: f32) -> (f32, f32) {
        (self.axes.x + fx * self.axes.w, self.axes.bottom() - fy * self.axes.h)
    }

    /// Bathymetry contours and land from the configured feature layers
    pub fn draw_features(&mut self, config: &RenderConfig) {
        if config.plot_bathy {
            features::draw_bathymetry(&mut self.layer, &self.projection, &config.features_dir, self.canvas.dpi);
        }
        if config.plot_land {
            features::draw_land(
                &mut self.layer,
                &self.projection,
                &config.features_dir,
                config.land_dataset,
                self.canvas.dpi,
            );
        }
    }

    /// Axes frame, graticule ticks, title and annotation
    pub fn decorate(
        &mut self,
        config: &RenderConfig,
        lon: &[f64],
        lat: &[f64],
        title: &str,
        annotation: Option<&str>,
    ) {
        self.finish_axes();
        let [lon0, lon1, lat0, lat1] = self.projection.extent;
        let x_ticks = axis_ticks(
            config.x_ticks.as_deref(),
            lon,
            config.tick_bins,
            config.tick_decimals,
            lon0,
            lon1,
        );
        let y_ticks = axis_ticks(
            config.y_ticks.as_deref(),
            lat,
            config.tick_bins,
            config.tick_decimals,
            lat0,
            lat1,
        );
        self.draw_ticks(&x_ticks, &y_ticks);
        self.draw_title(title);
        if let Some(text) = annotation {
            self.annotate(text, 0.02, 0.94);
        }
    }

    /// Copies the axes layer onto the page and draws the frame
    pub fn finish_axes(&mut self) {
        self.canvas.blit(&self.layer, self.axes.x, self.axes.y);
        let width = self.canvas.pt(FRAME_PT);
        self.canvas.stroke_rect(self.axes, width, BLACK);
    }

    /// Longitude ticks below the axes and latitude ticks on its left
    pub fn draw_ticks(&mut self, x_ticks: &[f64], y_ticks: &[f64]) {
        let len = self.canvas.pt(TICK_LEN_PT);
        let pad = self.canvas.pt(TICK_PAD_PT);
        let width = self.canvas.pt(FRAME_PT);
        let bottom = self.axes.bottom();
        let left = self.axes.x;

        for &lon in x_ticks {
            let (x, _) = self.projection.project(lon, 0.0);
            let x = self.axes.x + x;
            self.canvas.line((x, bottom), (x, bottom + len), width, BLACK);
            let label = format_lon(lon, self.tick_decimals);
            self.canvas
                .text(&label, x, bottom + len + pad, LABEL_PT, HAlign::Center, VAlign::Top);
        }
        for &lat in y_ticks {
            let (_, y) = self.projection.project(0.0, lat);
            let y = self.axes.y + y;
            self.canvas.line((left - len, y), (left, y), width, BLACK);
            let label = format_lat(lat, self.tick_decimals);
            self.canvas
                .text(&label, left - len - pad, y, LABEL_PT, HAlign::Right, VAlign::Middle);
        }
    }

    pub fn draw_title(&mut self, title: &str) {
        let x = self.axes.x + self.axes.w / 2.0;
        let y = self.axes.y - self.canvas.pt(6.0);
        self.canvas
            .text(title, x, y, TITLE_PT, HAlign::Center, VAlign::Bottom);
    }

    /// Text anchored at an axes fraction (origin bottom left)
    pub fn annotate(&mut self, text: &str, fx: f32, fy: f32) {
        let (x, y) = self.axes_point(fx, fy);
        self.canvas
            .text(text, x, y, LABEL_PT, HAlign::Left, VAlign::Bottom);
    }

    /// Draws the colorbar reserved at construction; a no-op otherwise.
    pub fn draw_colorbar(
        &mut self,
        cmap: &Colormap,
        norm: Normalization,
        vmin: f64,
        vmax: f64,
        label: Option<&str>,
    ) {
        let Some((rect, orientation)) = self.colorbar else {
            return;
        };
        let len = self.canvas.pt(TICK_LEN_PT);
        let pad = self.canvas.pt(TICK_PAD_PT);
        let width = self.canvas.pt(FRAME_PT);
        let x0 = rect.x.round() as i64;
        let y0 = rect.y.round() as i64;
        let (cw, ch) = (rect.w.round().max(1.0) as i64, rect.h.round().max(1.0) as i64);

        match orientation {
            ColorbarOrientation::Horizontal => {
                for i in 0..cw {
                    let color = cmap.sample((i as f64 + 0.5) / cw as f64);
                    let strip = Rect { x: (x0 + i) as f32, y: y0 as f32, w: 1.0, h: ch as f32 };
                    self.canvas.fill_rect(strip, color);
                }
            }
            ColorbarOrientation::Vertical => {
                for j in 0..ch {
                    let color = cmap.sample(1.0 - (j as f64 + 0.5) / ch as f64);
                    let strip = Rect { x: x0 as f32, y: (y0 + j) as f32, w: cw as f32, h: 1.0 };
                    self.canvas.fill_rect(strip, color);
                }
            }
        }
        self.canvas.stroke_rect(rect, width, BLACK);

        let ticks = norm.ticks(vmin, vmax, COLORBAR_TICKS);
        let mut extent = 0.0f32;
        for value in ticks {
            let Some(t) = norm.normalize(value, vmin, vmax) else {
                continue;
            };
            let t = t as f32;
            let text = format_number(value, 4);
            match orientation {
                ColorbarOrientation::Horizontal => {
                    let x = rect.x + t * rect.w;
                    self.canvas.line((x, rect.bottom()), (x, rect.bottom() + len), width, BLACK);
                    self.canvas.text(
                        &text,
                        x,
                        rect.bottom() + len + pad,
                        LABEL_PT,
                        HAlign::Center,
                        VAlign::Top,
                    );
                    extent = extent.max(self.canvas.text_size(&text, LABEL_PT).1);
                }
                ColorbarOrientation::Vertical => {
                    let y = rect.bottom() - t * rect.h;
                    self.canvas.line((rect.right(), y), (rect.right() + len, y), width, BLACK);
                    self.canvas.text(
                        &text,
                        rect.right() + len + pad,
                        y,
                        LABEL_PT,
                        HAlign::Left,
                        VAlign::Middle,
                    );
                    extent = extent.max(self.canvas.text_size(&text, LABEL_PT).0);
                }
            }
        }

        let Some(label) = label.filter(|l| !l.is_empty()) else {
            return;
        };
        match orientation {
            ColorbarOrientation::Horizontal => {
                let y = rect.bottom() + len + 2.0 * pad + extent;
                self.canvas.text(
                    label,
                    rect.x + rect.w / 2.0,
                    y,
                    LABEL_PT,
                    HAlign::Center,
                    VAlign::Top,
                );
            }
            ColorbarOrientation::Vertical => {
                let (_, label_h) = self.canvas.text_size(label, LABEL_PT);
                let x = rect.right() + len + 2.0 * pad + extent + label_h / 2.0;
                self.canvas
                    .text_vertical(label, x, rect.y + rect.h / 2.0, LABEL_PT);
            }
        }
    }

    /// Final page, cropped to its content
    pub fn into_image(self) -> RgbaImage {
        self.canvas.into_tight_image(TIGHT_PAD_PT)
    }
}

/// Largest rectangle centered in `area` with the aspect ratio of `extent`
fn fit_aspect(area: Rect, extent: [f64; 4]) -> Rect {
    let [lon0, lon1, lat0, lat1] = extent;
    let aspect = ((lat1 - lat0) / (lon1 - lon0)) as f32;
    if area.h / area.w > aspect {
        let h = area.w * aspect;
        Rect { x: area.x, y: area.y + (area.h - h) / 2.0, w: area.w, h }
    } else {
        let w = area.h / aspect;
        Rect { x: area.x + (area.w - w) / 2.0, y: area.y, w, h: area.h }
    }
}
