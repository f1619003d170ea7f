//! Scalar fields drawn as colored grid cells (pcolormesh) with a colorbar.

use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use log::{debug, warn};

use crate::canvas::LIGHT_GRAY;
use crate::colormap::{Colormap, Normalization};
use crate::config::RenderConfig;
use crate::dataset::Field;
use crate::error::{ClimfigError, Result};
use crate::map::{MapFigure, Projection, cell_lookup, resolve_extent};
use crate::style::ResolvedStyle;

/// Lower limit used by logarithmic scales when the data has no positive value
const LOG_FLOOR: f64 = 1e-3;

/// Colors every pixel of `layer` from the grid cell under it.
///
/// `color(j, i)` receives the `[lat, lon]` cell indices; pixels outside the
/// grid, and cells for which `color` returns `None`, are left untouched.
pub(crate) fn paint_grid<F>(layer: &mut RgbaImage, proj: &Projection, lon: &[f64], lat: &[f64], color: F)
where
    F: Fn(usize, usize) -> Option<Rgba<u8>>,
{
    let columns: Vec<Option<usize>> = (0..layer.width())
        .map(|px| cell_lookup(lon, proj.lon_at(px)))
        .collect();
    for py in 0..layer.height() {
        let Some(j) = cell_lookup(lat, proj.lat_at(py)) else {
            continue;
        };
        for (px, column) in columns.iter().enumerate() {
            if let Some(c) = column.and_then(|i| color(j, i)) {
                layer.put_pixel(px as u32, py, c);
            }
        }
    }
}

/// Colors the cells of `field`; masked cells are light gray.
pub(crate) fn paint_field(
    layer: &mut RgbaImage,
    proj: &Projection,
    field: &Field,
    cmap: &Colormap,
    norm: Normalization,
    (vmin, vmax): (f64, f64),
) {
    paint_grid(layer, proj, &field.lon, &field.lat, |j, i| {
        let value = field.values[[j, i]];
        if value.is_nan() {
            return Some(LIGHT_GRAY);
        }
        norm.normalize(value, vmin, vmax).map(|t| cmap.sample(t))
    });
}

/// Color scale limits: the configured ones, falling back to the data range.
///
/// Logarithmic scales need a positive lower limit; a non-positive `vmin` is
/// replaced by the smallest positive value of the field.
pub fn color_limits(field: &Field, style: &ResolvedStyle) -> (f64, f64) {
    let (lo, hi) = field.finite_range().unwrap_or_else(|| {
        warn!("Field has no valid values, using a unit color scale");
        (0.0, 1.0)
    });
    let mut vmin = style.vmin.unwrap_or(lo);
    let mut vmax = style.vmax.unwrap_or(hi);

    if style.norm == Normalization::Log && vmin <= 0.0 {
        let positive = crate::dataset::finite_range(field.values.iter().copied().filter(|v| *v > 0.0));
        vmin = positive.map(|(p, _)| p).unwrap_or(LOG_FLOOR);
        warn!("Logarithmic scale needs a positive minimum, using {}", vmin);
        if vmax <= vmin {
            vmax = vmin * 10.0;
        }
    }
    if vmin > vmax {
        warn!("vmin {} is above vmax {}, swapping", vmin, vmax);
        std::mem::swap(&mut vmin, &mut vmax);
    }
    (vmin, vmax)
}

/// Renders a scalar field on a map.
///
/// Masked (NaN) cells are drawn in the land color; the colorbar is labeled
/// with the field units.
pub fn map_pcolor(
    field: &Field,
    style: &ResolvedStyle,
    title: &str,
    annotation: Option<&str>,
    config: &RenderConfig,
    font: Option<FontArc>,
) -> Result<RgbaImage> {
    let (nlat, nlon) = field.values.dim();
    if nlat != field.lat.len() || nlon != field.lon.len() {
        return Err(ClimfigError::InvalidShape(format!(
            "values are {}x{} but the grid is {}x{}",
            nlat,
            nlon,
            field.lat.len(),
            field.lon.len()
        )));
    }
    let cmap = Colormap::by_name(&style.cmap)?;
    let (vmin, vmax) = color_limits(field, style);
    debug!("pcolor {} with {} over [{}, {}]", title, cmap.name, vmin, vmax);

    let extent = resolve_extent(config.extent, &field.lon, &field.lat)?;
    let mut fig = MapFigure::new(config, extent, Some(config.colorbar_orientation), font);

    let norm = style.norm;
    paint_field(&mut fig.layer, &fig.projection, field, &cmap, norm, (vmin, vmax));
    fig.draw_features(config);
    fig.decorate(config, &field.lon, &field.lat, title, annotation);
    fig.draw_colorbar(&cmap, norm, vmin, vmax, field.units.as_deref());
    Ok(fig.into_image())
}
