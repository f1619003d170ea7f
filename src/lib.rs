//! # climfig
//!
//! A Rust library and command line tool that draws map figures of gridded
//! ocean climatologies stored in NetCDF files.
//!
//! Every figure is described by its name alone. A name such as
//! `F12_mensual_temperatura_media_100m_M03` is parsed into its product type,
//! variable, statistic, depth and period; those fields select the NetCDF
//! variable and depth level to read, the colormap entry to apply and the
//! directory the PNG is written to.
//!
//! ## Features
//!
//! - **Figure-name grammar**: closed vocabularies, precise parse errors
//! - **Pcolor maps**: cell-centred rasters with a colorbar, linear or log scales
//! - **Quiver maps**: subsampled current vectors with a reference arrow
//! - **Map layers**: land, coastline and bathymetry from local GeoJSON files
//! - **Configuration**: JSON/YAML render settings and a JSON style table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use climfig::{PlotJob, plot_figure};
//! use climfig::config::RenderConfig;
//!
//! let job = PlotJob {
//!     figname: "F1_clim_temperatura_media_100m".to_string(),
//!     input: "clim_temperatura.nc".into(),
//!     render: RenderConfig::default(),
//!     overrides: Default::default(),
//! };
//! let path = plot_figure(&job).expect("Failed to draw figure");
//! println!("{}", path.display());
//! ```
//!
//! ## Figure Names
//!
//! ```text
//! <id>_clim_<var>_<stat>[_<depth>m]
//! <id>_mensual_<var>_<stat>[_<depth>m]_M<nn>
//! <id>_estacional_<var>_<stat>_<season>[_<depth>m]
//! ```

pub mod canvas;
pub mod cli;
pub mod colormap;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod figname;
pub mod info;
pub mod log;
pub mod map;
pub mod output;
pub mod pcolor;
pub mod quiver;
pub mod style;
pub mod vocab;

#[cfg(test)]
mod cli_tests;
#[cfg(test)]
mod tests;

use ::log::{debug, info, warn};
use ab_glyph::FontArc;
use image::RgbaImage;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::canvas::load_font;
use crate::config::RenderConfig;
use crate::dataset::ClimDataset;
use crate::error::Result;
use crate::figname::FigureName;
use crate::output::{create_tree, figure_path, save_png};
use crate::style::{ResolvedStyle, StyleConfig, StyleOverrides};
use crate::vocab::NcSource;

/// One figure to draw
#[derive(Debug, Clone)]
pub struct PlotJob {
    pub figname: String,
    pub input: PathBuf,
    pub render: RenderConfig,
    pub overrides: StyleOverrides,
}

/// Everything decided about a figure before any data is read
#[derive(Debug, Clone, Serialize)]
pub struct FigurePlan {
    pub name: String,
    pub input: PathBuf,
    pub source: NcSource,
    pub depth: Option<u32>,
    pub cmap: String,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub norm: colormap::Normalization,
    pub output: PathBuf,
}

/// Loads the style table, falling back to an empty one when the file does not exist.
pub fn load_styles(path: &Path) -> Result<StyleConfig> {
    if !path.exists() {
        warn!(
            "Style configuration {} not found, every figure uses the default style",
            path.display()
        );
        return Ok(StyleConfig::default());
    }
    debug!("Loading style configuration from {}", path.display());
    StyleConfig::from_file(path)
}

/// Draws figures sharing one render configuration, style table and font.
pub struct FigureRenderer {
    config: RenderConfig,
    styles: StyleConfig,
    overrides: StyleOverrides,
    font: Option<FontArc>,
}

impl FigureRenderer {
    pub fn new(config: RenderConfig, overrides: StyleOverrides) -> Result<Self> {
        config.validate()?;
        let styles = load_styles(&config.style_config)?;
        let font = load_font(config.font_path.as_deref())?;
        Ok(FigureRenderer {
            config,
            styles,
            overrides,
            font,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Resolves a figure without reading its data
    pub fn plan(&self, name: &FigureName, input: &Path) -> Result<FigurePlan> {
        let source = self.config.source_for(name.variable)?;
        let style = self.styles.resolve(name, &self.overrides);
        Ok(FigurePlan {
            name: name.to_string(),
            input: input.to_path_buf(),
            source,
            depth: name.depth,
            cmap: style.cmap,
            vmin: style.vmin,
            vmax: style.vmax,
            norm: style.norm,
            output: figure_path(&self.config.output_root, name),
        })
    }

    /// Reads the data of a figure and renders it
    pub fn render(&self, name: &FigureName, input: &Path) -> Result<RgbaImage> {
        let source = self.config.source_for(name.variable)?;
        let dataset = ClimDataset::open(input)?;
        let annotation = name.annotation();

        let image = match &source {
            NcSource::Scalar(var) => {
                let style: ResolvedStyle = self.styles.resolve(name, &self.overrides);
                let field = dataset.load_scalar(var, name.depth)?;
                let title = name.title(field.units.as_deref());
                info!("Drawing pcolor map of '{}' ({})", var, style.cmap);
                pcolor::map_pcolor(
                    &field,
                    &style,
                    &title,
                    annotation.as_deref(),
                    &self.config,
                    self.font.clone(),
                )?
            }
            NcSource::Vector { u, v } => {
                let field = dataset.load_vector(u, v, name.depth)?;
                let title = name.title(None);
                info!("Drawing quiver map of '{}'/'{}'", u, v);
                quiver::map_quiver(
                    &field,
                    &title,
                    annotation.as_deref(),
                    &self.config,
                    self.font.clone(),
                )?
            }
        };
        dataset.close()?;
        Ok(image)
    }

    /// Parses `figname`, renders it from `input` and saves the PNG.
    ///
    /// Returns the path of the written file.
    pub fn plot(&self, figname: &str, input: &Path) -> Result<PathBuf> {
        let name = FigureName::parse(figname)?;
        debug!("Parsed {:?}", name);
        let image = self.render(&name, input)?;
        let dir = create_tree(&self.config.output_root, &name)?;
        let path = dir.join(name.file_name());
        save_png(&image, &path)?;
        info!("Saved {}", path.display());
        Ok(path)
    }
}

/// Processes a single figure job end to end.
///
/// The pipeline:
/// 1. Parses the figure name
/// 2. Loads the style table and resolves the figure style
/// 3. Reads the field (or the two vector components) from the NetCDF file
/// 4. Renders the pcolor or quiver map
/// 5. Writes the PNG under `<output_root>/<tipo>/<var>/<stat>/`
///
/// # Errors
///
/// Fails when the name does not follow the grammar, the variable has no
/// NetCDF mapping or is missing from the file, the requested depth is not in
/// the depth axis, the colormap is unknown, or the PNG cannot be written.
pub fn plot_figure(job: &PlotJob) -> Result<PathBuf> {
    let renderer = FigureRenderer::new(job.render.clone(), job.overrides.clone())?;
    renderer.plot(&job.figname, &job.input)
}

/// Parses and resolves a job without reading data or writing files
pub fn resolve_job(job: &PlotJob) -> Result<FigurePlan> {
    let name = FigureName::parse(&job.figname)?;
    let renderer = FigureRenderer::new(job.render.clone(), job.overrides.clone())?;
    renderer.plan(&name, &job.input)
}
