//! # Style Configuration Module
//!
//! Colormap and color-scale limits per figure, read from the project's
//! `config_plot.json`. Entries are nested by variable, period key, depth key
//! and statistic:
//!
//! ```json
//! {
//!   "temperatura": {
//!     "0": {
//!       "100": {
//!         "media": { "cmap": "jet", "vmin": 10.0, "vmax": 28.0 }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! The period key is `"0"` for `clim`, the month number for `mensual` and the
//! season name for `estacional`; the depth key is `"-1"` when the figure has
//! no depth.
//!
//! Resolution precedence, lowest first: built-in defaults, the configuration
//! entry, command line overrides.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::colormap::Normalization;
use crate::error::Result;
use crate::figname::FigureName;

pub const DEFAULT_CMAP: &str = "viridis";

/// One leaf of the style configuration. Every field is optional so partial
/// entries and command line overrides share the same type.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct StyleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm: Option<Normalization>,
}

/// Style overrides coming from the command line
pub type StyleOverrides = StyleEntry;

type StatTable = HashMap<String, StyleEntry>;
type DepthTable = HashMap<String, StatTable>;
type PeriodTable = HashMap<String, DepthTable>;

/// The whole colormap configuration
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct StyleConfig {
    pub variables: HashMap<String, PeriodTable>,
}

/// Fully resolved style used by the renderers
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub cmap: String,
    /// `None` means the data minimum
    pub vmin: Option<f64>,
    /// `None` means the data maximum
    pub vmax: Option<f64>,
    pub norm: Normalization,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        ResolvedStyle {
            cmap: DEFAULT_CMAP.to_string(),
            vmin: None,
            vmax: None,
            norm: Normalization::Linear,
        }
    }
}

impl ResolvedStyle {
    fn apply(&mut self, entry: &StyleEntry) {
        if let Some(cmap) = &entry.cmap {
            self.cmap = cmap.clone();
        }
        if entry.vmin.is_some() {
            self.vmin = entry.vmin;
        }
        if entry.vmax.is_some() {
            self.vmax = entry.vmax;
        }
        if let Some(norm) = entry.norm {
            self.norm = norm;
        }
    }
}

impl StyleConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: StyleConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    /// Entry stored for a figure, if any
    pub fn lookup(&self, name: &FigureName) -> Option<&StyleEntry> {
        self.variables
            .get(name.variable.as_str())?
            .get(&name.period_key())?
            .get(&name.depth_key())?
            .get(name.statistic.as_str())
    }

    /// Adds or replaces the entry of a figure
    pub fn insert(&mut self, name: &FigureName, entry: StyleEntry) {
        self.variables
            .entry(name.variable.as_str().to_string())
            .or_default()
            .entry(name.period_key())
            .or_default()
            .entry(name.depth_key())
            .or_default()
            .insert(name.statistic.as_str().to_string(), entry);
    }

    /// Example table covering each period key kind
    pub fn template() -> Self {
        let mut config = StyleConfig::default();
        let entries = [
            ("F1_clim_temperatura_media_100m", "jet", Some(10.0), Some(28.0), None),
            ("F2_mensual_salinidad_media_M07", "viridis", Some(35.5), Some(37.0), None),
            ("F3_estacional_nivel-mar_promedio_verano", "RdBu_r", Some(-0.5), Some(0.5), None),
            (
                "F4_clim_clorofila_promedio",
                "YlGnBu",
                Some(0.01),
                Some(10.0),
                Some(Normalization::Log),
            ),
        ];
        for (figname, cmap, vmin, vmax, norm) in entries {
            if let Ok(name) = FigureName::parse(figname) {
                config.insert(
                    &name,
                    StyleEntry {
                        cmap: Some(cmap.to_string()),
                        vmin,
                        vmax,
                        norm,
                    },
                );
            }
        }
        config
    }

    /// Resolves the style of a figure: defaults, then the stored entry, then `overrides`.
    ///
    /// A missing entry is not an error; the figure is drawn with the defaults.
    pub fn resolve(&self, name: &FigureName, overrides: &StyleOverrides) -> ResolvedStyle {
        let mut style = ResolvedStyle::default();
        match self.lookup(name) {
            Some(entry) => {
                debug!("Style entry for {}: {:?}", name, entry);
                style.apply(entry);
            }
            None => warn!(
                "No style entry for {}[{}][{}][{}], using defaults",
                name.variable,
                name.period_key(),
                name.depth_key(),
                name.statistic
            ),
        }
        style.apply(overrides);
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
    {
        "temperatura": {
            "0": {
                "100": {
                    "media": { "cmap": "jet", "vmin": 10.0, "vmax": 28.0 },
                    "desviacion-estandar": { "cmap": "plasma", "vmin": 0.0, "vmax": 3.0 }
                }
            },
            "3": {
                "-1": {
                    "media": { "cmap": "coolwarm", "vmin": null, "vmax": 30.0 }
                }
            }
        },
        "clorofila": {
            "invierno": {
                "-1": {
                    "promedio": { "cmap": "YlGnBu", "vmin": 0.01, "vmax": 10.0, "norm": "log" }
                }
            }
        }
    }"#;

    fn name(s: &str) -> FigureName {
        FigureName::parse(s).unwrap()
    }

    #[test]
    fn test_lookup() {
        let config = StyleConfig::from_json(CONFIG).unwrap();
        let entry = config.lookup(&name("F1_clim_temperatura_media_100m")).unwrap();
        assert_eq!(entry.cmap.as_deref(), Some("jet"));
        assert_eq!(entry.vmin, Some(10.0));
        assert_eq!(entry.vmax, Some(28.0));

        let entry = config.lookup(&name("F2_mensual_temperatura_media_M03")).unwrap();
        assert_eq!(entry.cmap.as_deref(), Some("coolwarm"));
        assert_eq!(entry.vmin, None);

        let entry = config
            .lookup(&name("F3_estacional_clorofila_promedio_invierno"))
            .unwrap();
        assert_eq!(entry.norm, Some(Normalization::Log));

        assert!(config.lookup(&name("F4_clim_temperatura_media_200m")).is_none());
        assert!(config.lookup(&name("F5_clim_salinidad_media_100m")).is_none());
    }

    #[test]
    fn test_resolve_precedence() {
        let config = StyleConfig::from_json(CONFIG).unwrap();
        let fig = name("F1_clim_temperatura_media_100m");

        let style = config.resolve(&fig, &StyleOverrides::default());
        assert_eq!(style.cmap, "jet");
        assert_eq!(style.vmin, Some(10.0));
        assert_eq!(style.vmax, Some(28.0));
        assert_eq!(style.norm, Normalization::Linear);

        let overrides = StyleOverrides {
            cmap: Some("viridis_r".to_string()),
            vmax: Some(25.0),
            ..Default::default()
        };
        let style = config.resolve(&fig, &overrides);
        assert_eq!(style.cmap, "viridis_r");
        assert_eq!(style.vmin, Some(10.0));
        assert_eq!(style.vmax, Some(25.0));
    }

    #[test]
    fn test_resolve_missing_entry_uses_defaults() {
        let config = StyleConfig::from_json(CONFIG).unwrap();
        let style = config.resolve(
            &name("F9_clim_salinidad_maximos_10m"),
            &StyleOverrides::default(),
        );
        assert_eq!(style, ResolvedStyle::default());
    }

    #[test]
    fn test_insert_round_trips_through_lookup() {
        let mut config = StyleConfig::default();
        let fig = name("F1_estacional_velocidad_maximos_verano_20m");
        let entry = StyleEntry {
            cmap: Some("Blues".to_string()),
            vmin: Some(0.0),
            vmax: Some(1.5),
            norm: None,
        };
        config.insert(&fig, entry.clone());
        assert_eq!(config.lookup(&fig), Some(&entry));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["velocidad"]["verano"]["20"]["maximos"]["cmap"], "Blues");
    }

    #[test]
    fn test_invalid_json() {
        assert!(StyleConfig::from_json("{ not json").is_err());
        assert!(StyleConfig::from_json(r#"{ "temperatura": 3 }"#).is_err());
    }
}
