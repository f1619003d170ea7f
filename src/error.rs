//! # Error Types
//!
//! Library-wide error enum. Figure-name parsing has its own error type
//! ([`FigNameError`]) which is wrapped here so the pipeline can use `?` end to end.

use crate::figname::FigNameError;
use thiserror::Error;

/// Errors that can occur while producing a figure
#[derive(Error, Debug)]
pub enum ClimfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid font: {0}")]
    InvalidFont(#[from] ab_glyph::InvalidFont),

    #[error("invalid figure name: {0}")]
    FigName(#[from] FigNameError),

    #[error("variable '{0}' not found in NetCDF file")]
    VariableNotFound(String),

    #[error("no NetCDF variable is mapped to figure variable '{0}'")]
    UnmappedVariable(String),

    #[error("coordinate variable not found, tried: {0}")]
    CoordinateNotFound(String),

    #[error("depth {0} m not present in the depth axis")]
    DepthNotFound(u32),

    #[error("unknown colormap: {0}")]
    UnknownColormap(String),

    #[error("invalid data shape: {0}")]
    InvalidShape(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ClimfigError>;
