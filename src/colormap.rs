//! # Colormaps
//!
//! Named colormaps sampled from evenly spaced control colors, plus the value
//! normalizations used to map data into the `[0, 1]` colormap domain.
//!
//! Any colormap can be reversed with an `_r` suffix (`viridis_r`).

use clap::ValueEnum;
use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::{ClimfigError, Result};

const VIRIDIS: &[u32] = &[
    0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58, 0xb5de2b,
    0xfde725,
];
const PLASMA: &[u32] = &[
    0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a, 0xfdca26,
    0xf0f921,
];
const INFERNO: &[u32] = &[
    0x000004, 0x1b0c41, 0x4a0c6b, 0x781c6d, 0xa52c60, 0xcf4446, 0xed6925, 0xfb9b06, 0xf7d13d,
    0xfcffa4,
];
const MAGMA: &[u32] = &[
    0x000004, 0x180f3d, 0x440f76, 0x721f81, 0x9e2f7f, 0xcd4071, 0xf1605d, 0xfd9668, 0xfeca8d,
    0xfcfdbf,
];
const CIVIDIS: &[u32] = &[
    0x00224e, 0x123570, 0x3b496c, 0x575d6d, 0x707173, 0x8a8678, 0xa59c74, 0xc3b369, 0xe1cc55,
    0xfee838,
];
const JET: &[u32] = &[
    0x00007f, 0x0000ff, 0x007fff, 0x00ffff, 0x7fff7f, 0xffff00, 0xff7f00, 0xff0000, 0x7f0000,
];
const COOLWARM: &[u32] = &[
    0x3b4cc0, 0x6788ee, 0x9abbff, 0xc9d7f0, 0xedd1c2, 0xf7a889, 0xe26952, 0xb40426,
];
const RDBU: &[u32] = &[
    0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3,
    0x2166ac, 0x053061,
];
const BLUES: &[u32] = &[
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
const YLGNBU: &[u32] = &[
    0xffffd9, 0xedf8b1, 0xc7e9b4, 0x7fcdbb, 0x41b6c4, 0x1d91c0, 0x225ea8, 0x253494, 0x081d58,
];
const SPECTRAL: &[u32] = &[
    0x9e0142, 0xd53e4f, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xe6f598, 0xabdda4, 0x66c2a5,
    0x3288bd, 0x5e4fa2,
];
const GRAY: &[u32] = &[0x000000, 0xffffff];

const NAMED: &[(&str, &[u32])] = &[
    ("viridis", VIRIDIS),
    ("plasma", PLASMA),
    ("inferno", INFERNO),
    ("magma", MAGMA),
    ("cividis", CIVIDIS),
    ("jet", JET),
    ("coolwarm", COOLWARM),
    ("RdBu", RDBU),
    ("Blues", BLUES),
    ("YlGnBu", YLGNBU),
    ("Spectral", SPECTRAL),
    ("gray", GRAY),
];

/// Names accepted by [`Colormap::by_name`] (without the `_r` variants)
pub fn available() -> impl Iterator<Item = &'static str> {
    NAMED.iter().map(|(name, _)| *name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<[u8; 3]>,
}

impl Colormap {
    pub fn by_name(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let (_, colors) = NAMED
            .iter()
            .find(|(n, _)| *n == base)
            .ok_or_else(|| {
                let known: Vec<&str> = available().collect();
                ClimfigError::UnknownColormap(format!("{} (known: {})", name, known.join(", ")))
            })?;

        let mut stops: Vec<[u8; 3]> = colors
            .iter()
            .map(|c| [(c >> 16) as u8, (c >> 8) as u8, *c as u8])
            .collect();
        if reversed {
            stops.reverse();
        }
        Ok(Colormap {
            name: name.to_string(),
            stops,
        })
    }

    /// Color at position `t` in `[0, 1]`; values outside are clipped.
    pub fn sample(&self, t: f64) -> Rgba<u8> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.stops.len() - 1;
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last);
        let j = (i + 1).min(last);
        let frac = pos - i as f64;

        let (a, b) = (self.stops[i], self.stops[j]);
        let lerp = |k: usize| (a[k] as f64 + (b[k] as f64 - a[k] as f64) * frac).round() as u8;
        Rgba([lerp(0), lerp(1), lerp(2), 255])
    }
}

/// Mapping of data values onto the colormap domain
#[derive(ValueEnum, Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Linear scale between vmin and vmax
    #[default]
    Linear,
    /// Logarithmic scale, non-positive values are masked
    Log,
}

impl Normalization {
    /// Position of `value` in `[0, 1]`, `None` for masked values.
    pub fn normalize(&self, value: f64, vmin: f64, vmax: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let t = match self {
            Normalization::Linear => {
                if vmax == vmin {
                    return Some(0.5);
                }
                (value - vmin) / (vmax - vmin)
            }
            Normalization::Log => {
                if value <= 0.0 || vmin <= 0.0 || vmax <= 0.0 {
                    return None;
                }
                if vmax == vmin {
                    return Some(0.5);
                }
                (value.ln() - vmin.ln()) / (vmax.ln() - vmin.ln())
            }
        };
        Some(t.clamp(0.0, 1.0))
    }

    /// Inverse of [`normalize`](Self::normalize)
    pub fn value_at(&self, t: f64, vmin: f64, vmax: f64) -> f64 {
        match self {
            Normalization::Linear => vmin + t * (vmax - vmin),
            Normalization::Log => (vmin.ln() + t * (vmax.ln() - vmin.ln())).exp(),
        }
    }

    /// Tick values for a colorbar spanning `[vmin, vmax]`
    pub fn ticks(&self, vmin: f64, vmax: f64, max_ticks: usize) -> Vec<f64> {
        match self {
            Normalization::Linear => nice_ticks(vmin, vmax, max_ticks),
            Normalization::Log => {
                if vmin <= 0.0 || vmax <= vmin {
                    return vec![];
                }
                let lo = (vmin.log10() - 1e-9).ceil() as i32;
                let hi = (vmax.log10() + 1e-9).floor() as i32;
                (lo..=hi).map(|e| 10f64.powi(e)).collect()
            }
        }
    }
}

/// Round-numbered ticks (steps of 1, 2, 2.5 or 5 times a power of ten) inside `[lo, hi]`
pub fn nice_ticks(lo: f64, hi: f64, max_ticks: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() || hi <= lo || max_ticks < 2 {
        return vec![];
    }
    let raw = (hi - lo) / (max_ticks - 1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let eps = step * 1e-9;
    let mut ticks = Vec::new();
    let mut k = (lo / step).ceil();
    while k * step <= hi + eps {
        // snap to the step grid to avoid values like 0.30000000000000004
        let v = k * step;
        ticks.push(if v.abs() < eps { 0.0 } else { v });
        k += 1.0;
    }
    ticks
}
