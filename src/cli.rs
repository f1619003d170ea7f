//! # CLI Module
//!
//! Command-line interface for climfig:
//! - Argument parsing with clap
//! - Render configuration loading (JSON/YAML) with flag overrides
//! - Environment variable support with the CLIMFIG_ prefix
//! - Batch lists of figures with a progress bar

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::colormap::Normalization;
use crate::config::{ColorbarOrientation, LandDataset, RenderConfig};
use crate::style::StyleOverrides;

/// Map figures from gridded oceanographic NetCDF climatologies
#[derive(Parser, Debug)]
#[command(name = "climfig")]
#[command(about = "Draw climatology map figures from NetCDF files, driven by the figure name")]
#[command(version)]
#[command(long_about = "
climfig draws static map figures (pcolor fields and current vectors) from
gridded ocean climatologies stored in NetCDF files.

The figure name carries everything needed to draw it:

  <id>_clim_<var>_<stat>[_<depth>m]
  <id>_mensual_<var>_<stat>[_<depth>m]_M<nn>
  <id>_estacional_<var>_<stat>_<season>[_<depth>m]

The name selects the NetCDF variable and depth level, the colormap entry in
config_plot.json and the output path <root>/<tipo>/<var>/<stat>/<name>.png.

EXAMPLES:
  # One figure
  climfig plot F1_clim_temperatura_media_100m clim_temperatura.nc

  # Override the colormap
  climfig plot F2_mensual_salinidad_media_M07 clim_sal.nc --cmap viridis_r --vmin 35

  # Check what would be drawn
  climfig plot F3_estacional_nivel-mar_promedio_verano ssh.nc --dry-run

  # Many figures
  climfig batch figures.txt --config render.yaml

  # Inspect a name or a file
  climfig parse F12_mensual_temperatura_media_100m_M03 --output-format json
  climfig info clim_temperatura.nc
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Render configuration file (JSON or YAML)
    #[arg(short, long, global = true, env = "CLIMFIG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draw one figure
    #[command(long_about = "
Draw one figure from a NetCDF file.

The figure name decides the product, variable, statistic, depth and period.
Style comes from the colormap configuration, then from the flags below.

The PNG is saved under the canonical form of the name, which can differ from
the name given: F1_mensual_temperatura_media_0100m_M7 is written as
F1_mensual_temperatura_media_100m_M07.png.

EXAMPLES:
  climfig plot F1_clim_temperatura_media_100m clim_temperatura.nc
  climfig plot F4_clim_corrientes-vectores_media_10m currents.nc --output-root out
  climfig plot F5_clim_clorofila_promedio chl.nc --norm log --vmin 0.01 --vmax 10
")]
    Plot {
        /// Figure name, optionally ending in .png
        #[arg(value_name = "FIGNAME")]
        figname: String,

        /// Input NetCDF file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        render: RenderArgs,

        #[command(flatten)]
        style: StyleArgs,

        /// Dry run - parse and resolve the figure without reading data
        #[arg(long, env = "CLIMFIG_DRY_RUN")]
        dry_run: bool,
    },

    /// Draw every figure listed in a file
    #[command(long_about = "
Draw many figures. Each non-empty line of LIST is

  <FIGNAME> <INPUT>

Lines starting with '#' are ignored. Failed figures are reported and
counted; the command fails if any figure failed.

EXAMPLES:
  climfig batch figures.txt
  climfig batch figures.txt --config render.yaml --output-root Figuras
")]
    Batch {
        /// File listing the figures to draw
        #[arg(value_name = "LIST")]
        list: PathBuf,

        #[command(flatten)]
        render: RenderArgs,

        #[command(flatten)]
        style: StyleArgs,

        /// Stop at the first failed figure
        #[arg(long)]
        fail_fast: bool,
    },

    /// Show the components of a figure name
    Parse {
        /// Figure name to parse
        figname: String,
    },

    /// Show information about a NetCDF file
    #[command(long_about = "
Inspect a NetCDF file: dimensions, variables, attributes, and which figure
variables it can serve with the current render configuration.

EXAMPLES:
  climfig info clim_temperatura.nc
  climfig info currents.nc -n u --output-format json
")]
    Info {
        /// NetCDF file path
        file: PathBuf,

        /// Show global attributes
        #[arg(long)]
        detailed: bool,

        /// Show only specific variable info
        #[arg(short = 'n', long)]
        variable: Option<String>,
    },

    /// Generate configuration templates
    #[command(long_about = "
Generate configuration templates.

Available templates:
  style:  colormap configuration (config_plot.json)
  render: render configuration (figure size, ticks, layers, quiver)

EXAMPLES:
  climfig template style > config_plot.json
  climfig template render --format yaml -o render.yaml
")]
    Template {
        /// Template type to generate
        #[arg(value_enum)]
        template_type: TemplateType,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Generate shell completions
    #[command(long_about = "
Generate shell completion scripts for bash, zsh, fish and PowerShell.

EXAMPLES:
  climfig completions bash > ~/.bash_completion.d/climfig
  climfig completions zsh -o _climfig
")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Flags overriding the render configuration
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct RenderArgs {
    /// Colormap configuration file
    #[arg(long, env = "CLIMFIG_STYLE_CONFIG")]
    pub style_config: Option<PathBuf>,

    /// Root of the output directory tree
    #[arg(long, env = "CLIMFIG_OUTPUT_ROOT")]
    pub output_root: Option<PathBuf>,

    /// Output resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// TrueType font for figure text
    #[arg(long, env = "CLIMFIG_FONT")]
    pub font: Option<PathBuf>,

    /// Directory with the GeoJSON land and bathymetry layers
    #[arg(long, env = "CLIMFIG_FEATURES_DIR")]
    pub features_dir: Option<PathBuf>,

    /// Land layer to draw
    #[arg(long, value_enum)]
    pub land: Option<LandDataset>,

    /// Do not draw land layers
    #[arg(long)]
    pub no_land: bool,

    /// Do not draw bathymetry contours
    #[arg(long)]
    pub no_bathy: bool,

    /// Colorbar orientation
    #[arg(long, value_enum)]
    pub colorbar: Option<ColorbarOrientation>,

    /// Draw one arrow every N grid points
    #[arg(long, value_name = "N")]
    pub slice_interval: Option<usize>,

    /// Map extent: lon_min,lon_max,lat_min,lat_max
    #[arg(long, value_parser = parse_extent, allow_hyphen_values = true)]
    pub extent: Option<[f64; 4]>,
}

impl RenderArgs {
    /// Applies the flags given on the command line on top of `config`
    pub fn apply(&self, config: &mut RenderConfig) {
        if let Some(path) = &self.style_config {
            config.style_config = path.clone();
        }
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }
        if let Some(dir) = &self.features_dir {
            config.features_dir = dir.clone();
        }
        if let Some(land) = self.land {
            config.land_dataset = land;
        }
        if self.no_land {
            config.plot_land = false;
        }
        if self.no_bathy {
            config.plot_bathy = false;
        }
        if let Some(orientation) = self.colorbar {
            config.colorbar_orientation = orientation;
        }
        if let Some(step) = self.slice_interval {
            config.quiver.slice_interval = step;
        }
        if self.extent.is_some() {
            config.extent = self.extent;
        }
    }
}

/// Flags overriding the colormap configuration
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct StyleArgs {
    /// Colormap name (append _r to reverse)
    #[arg(long)]
    pub cmap: Option<String>,

    /// Lower color limit
    #[arg(long, allow_hyphen_values = true)]
    pub vmin: Option<f64>,

    /// Upper color limit
    #[arg(long, allow_hyphen_values = true)]
    pub vmax: Option<f64>,

    /// Color scale normalization
    #[arg(long, value_enum)]
    pub norm: Option<Normalization>,
}

impl From<&StyleArgs> for StyleOverrides {
    fn from(args: &StyleArgs) -> Self {
        StyleOverrides {
            cmap: args.cmap.clone(),
            vmin: args.vmin,
            vmax: args.vmax,
            norm: args.norm,
        }
    }
}

#[derive(ValueEnum, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
    /// CSV output (where applicable)
    Csv,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum TemplateType {
    /// Colormap configuration
    Style,
    /// Render configuration
    Render,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

/// One line of a batch list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub line: usize,
    pub figname: String,
    pub input: PathBuf,
}

/// Parse map extent from command line argument
/// Format: lon_min,lon_max,lat_min,lat_max
fn parse_extent(s: &str) -> Result<[f64; 4], String> {
    let values: Result<Vec<f64>, _> = s.split(',').map(|v| v.trim().parse::<f64>()).collect();
    let values = values.map_err(|_| "Invalid numeric value in extent")?;
    let [lon0, lon1, lat0, lat1] = values[..] else {
        return Err("Extent must be in format 'lon_min,lon_max,lat_min,lat_max'".to_string());
    };
    if lon0 >= lon1 || lat0 >= lat1 {
        return Err("Extent minimums must be less than maximums".to_string());
    }
    Ok([lon0, lon1, lat0, lat1])
}

/// Parse a batch list: `<FIGNAME> <INPUT>` per line, `#` comments and blank lines skipped.
pub fn parse_batch_list(content: &str) -> Result<Vec<BatchEntry>, String> {
    let mut entries = Vec::new();
    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(figname), Some(input), None) => entries.push(BatchEntry {
                line: i + 1,
                figname: figname.to_string(),
                input: PathBuf::from(input),
            }),
            _ => {
                return Err(format!(
                    "line {}: expected '<FIGNAME> <INPUT>', got '{}'",
                    i + 1,
                    line
                ));
            }
        }
    }
    Ok(entries)
}
