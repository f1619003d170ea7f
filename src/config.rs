//! # Render Configuration Module
//!
//! Settings shared by every figure of a run: page geometry, map decorations,
//! feature layers, quiver parameters and where inputs and outputs live.
//! Files can be JSON or YAML (chosen by extension); every field has a default
//! so an empty document is a valid configuration.
//!
//! ```yaml
//! output_root: Figuras
//! style_config: config_plot.json
//! dpi: 200
//! x_ticks: [-98, -95, -92, -89, -86, -83, -80, -77]
//! y_ticks: [18, 20, 22, 24, 26, 28, 30, 32]
//! land_dataset: gshhs
//! quiver:
//!   slice_interval: 8
//! variables:
//!   temperatura: pot_temp
//!   corrientes-vectores: { u: u, v: v }
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ClimfigError, Result};
use crate::figname::Variable;
use crate::vocab::{NcSource, default_source};

/// Source of land polygons
#[derive(ValueEnum, Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LandDataset {
    /// Full resolution GSHHS shorelines, filled
    #[default]
    Gshhs,
    /// Natural Earth 10m land polygons, filled
    NaturalEarth,
    /// Natural Earth 10m coastlines, lines only
    Coastline,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorbarOrientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Quiver plot parameters
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct QuiverConfig {
    /// Draw one arrow every `slice_interval` grid points in each direction
    pub slice_interval: usize,
    /// Length of the reference arrow; derived from the data when absent
    pub key_size: Option<f64>,
    /// Units printed next to the reference arrow; the data units when absent
    pub key_units: Option<String>,
}

/// Key units used when neither the configuration nor the data give any
pub const DEFAULT_KEY_UNITS: &str = "m s⁻¹";

impl Default for QuiverConfig {
    fn default() -> Self {
        QuiverConfig {
            slice_interval: 8,
            key_size: None,
            key_units: None,
        }
    }
}

/// NetCDF variable override for one figure variable
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SourceOverride {
    Scalar(String),
    Vector { u: String, v: String },
}

impl From<SourceOverride> for NcSource {
    fn from(o: SourceOverride) -> Self {
        match o {
            SourceOverride::Scalar(name) => NcSource::Scalar(name),
            SourceOverride::Vector { u, v } => NcSource::Vector { u, v },
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Root of the figure directory tree
    pub output_root: PathBuf,
    /// Colormap configuration file
    pub style_config: PathBuf,
    /// Figure size in inches (width, height)
    pub figure_size: [f64; 2],
    pub dpi: u32,
    /// TrueType font used for all text; system serif fonts are tried when absent
    pub font_path: Option<PathBuf>,
    /// Number of ticks per axis when no explicit ticks are given
    pub tick_bins: usize,
    pub tick_decimals: i32,
    pub x_ticks: Option<Vec<f64>>,
    pub y_ticks: Option<Vec<f64>>,
    /// Map extent `[lon_min, lon_max, lat_min, lat_max]`; the data bounds when absent
    pub extent: Option<[f64; 4]>,
    pub plot_land: bool,
    pub land_dataset: LandDataset,
    pub plot_bathy: bool,
    /// Directory holding the GeoJSON land, coastline and bathymetry layers
    pub features_dir: PathBuf,
    pub colorbar_orientation: ColorbarOrientation,
    pub quiver: QuiverConfig,
    /// Per-variable NetCDF names, keyed by figure variable token
    pub variables: HashMap<String, SourceOverride>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            output_root: PathBuf::from("Figuras"),
            style_config: PathBuf::from("config_plot.json"),
            figure_size: [8.0, 8.0],
            dpi: 200,
            font_path: None,
            tick_bins: 4,
            tick_decimals: 1,
            x_ticks: None,
            y_ticks: None,
            extent: None,
            plot_land: true,
            land_dataset: LandDataset::Gshhs,
            plot_bathy: true,
            features_dir: PathBuf::from("features"),
            colorbar_orientation: ColorbarOrientation::Horizontal,
            quiver: QuiverConfig::default(),
            variables: HashMap::new(),
        }
    }
}

impl RenderConfig {
    /// Loads a configuration file, YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: RenderConfig = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let config: RenderConfig = serde_yaml::from_str(yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ClimfigError::InvalidConfig(msg));
        if self.dpi == 0 {
            return invalid("dpi must be positive".to_string());
        }
        if self.figure_size.iter().any(|s| !(*s > 0.0)) {
            return invalid(format!("figure_size must be positive, got {:?}", self.figure_size));
        }
        if self.quiver.slice_interval == 0 {
            return invalid("quiver.slice_interval must be at least 1".to_string());
        }
        for (axis, ticks) in [("x", &self.x_ticks), ("y", &self.y_ticks)] {
            if ticks.is_none() && self.tick_bins < 2 {
                return invalid(format!(
                    "tick_bins must be at least 2 when {}_ticks is not given",
                    axis
                ));
            }
        }
        if let Some([lon0, lon1, lat0, lat1]) = self.extent {
            if lon0 >= lon1 || lat0 >= lat1 {
                return invalid(format!("extent must be [lon_min, lon_max, lat_min, lat_max], got {:?}", self.extent));
            }
        }
        for key in self.variables.keys() {
            if key.parse::<Variable>().is_err() {
                return invalid(format!("unknown figure variable '{}' in variables", key));
            }
        }
        Ok(())
    }

    /// NetCDF variable(s) to read for a figure variable
    pub fn source_for(&self, variable: Variable) -> Result<NcSource> {
        if let Some(o) = self.variables.get(variable.as_str()) {
            return Ok(o.clone().into());
        }
        default_source(variable)
            .ok_or_else(|| ClimfigError::UnmappedVariable(variable.as_str().to_string()))
    }

    /// Image size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let [w, h] = self.figure_size;
        let dpi = self.dpi as f64;
        ((w * dpi).round() as u32, (h * dpi).round() as u32)
    }

    /// Template used by `climfig template render`, set up for the Gulf of Mexico domain
    pub fn template() -> Self {
        RenderConfig {
            x_ticks: Some(vec![-98.0, -95.0, -92.0, -89.0, -86.0, -83.0, -80.0, -77.0]),
            y_ticks: Some(vec![18.0, 20.0, 22.0, 24.0, 26.0, 28.0, 30.0, 32.0]),
            variables: HashMap::from([
                ("temperatura".to_string(), SourceOverride::Scalar("pot_temp".to_string())),
                (
                    "corrientes-vectores".to_string(),
                    SourceOverride::Vector { u: "u".to_string(), v: "v".to_string() },
                ),
            ]),
            ..Default::default()
        }
    }
}
