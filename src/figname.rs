//! # Figure Name Module
//!
//! Parses the underscore-delimited figure names used by the climatology project
//! into their semantic components and builds everything derived from them:
//! plot title, annotation, style-configuration keys and the output location.
//!
//! ## Grammar
//!
//! | type         | components                              |
//! |--------------|-----------------------------------------|
//! | `clim`       | id, tipo, var, stat, [depth]            |
//! | `mensual`    | id, tipo, var, stat, [depth], mes       |
//! | `estacional` | id, tipo, var, stat, estacion, [depth]  |
//!
//! The depth token is written `<meters>m` and may be omitted for surface or
//! vertically integrated fields. Months are written `M01` .. `M12` (`M7` is also
//! accepted). A trailing
//! `.png` extension is accepted and ignored.
//!
//! ## Example
//!
//! ```rust
//! use climfig::figname::{FigureName, Period, ProductType};
//!
//! let name = FigureName::parse("F12_mensual_temperatura_media_100m_M03.png")?;
//! assert_eq!(name.product, ProductType::Mensual);
//! assert_eq!(name.depth, Some(100));
//! assert_eq!(name.period, Period::Month(3));
//! # Ok::<(), climfig::figname::FigNameError>(())
//! ```

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::vocab::month_name;

/// Errors produced while parsing a figure name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FigNameError {
    #[error("expected at least 4 '_' separated tokens, found {0}")]
    TooFewTokens(usize),

    #[error("empty {0} token")]
    EmptyToken(&'static str),

    #[error("unknown {field} '{token}'")]
    UnknownToken { field: &'static str, token: String },

    #[error("invalid month token '{0}', expected M1..M12 or M01..M12")]
    InvalidMonth(String),

    #[error("missing {0} component")]
    MissingField(&'static str),

    #[error("unexpected trailing tokens: {0}")]
    TrailingTokens(String),
}

/// Climatology product type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductType {
    /// All-time climatology
    Clim,
    /// Monthly climatology
    Mensual,
    /// Seasonal climatology
    Estacional,
}

/// Physical or biogeochemical variable shown in a figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variable {
    CapaMezcla,
    NivelMar,
    Temperatura,
    Salinidad,
    Velocidad,
    Nitratos,
    Carbono,
    Clorofila,
    CorrientesVectores,
}

/// Statistic computed over the climatological period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Statistic {
    Media,
    DesviacionEstandar,
    Maximos,
    Minimos,
    Promedio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Season {
    #[serde(rename = "invierno")]
    Invierno,
    #[serde(rename = "primavera")]
    Primavera,
    #[serde(rename = "otoño")]
    Otono,
    #[serde(rename = "verano")]
    Verano,
}

/// Time period a figure covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    All,
    Month(u8),
    Season(Season),
}

/// A parsed figure name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FigureName {
    pub id: String,
    pub product: ProductType,
    pub variable: Variable,
    pub statistic: Statistic,
    /// Depth in meters, `None` for surface or vertically integrated fields
    pub depth: Option<u32>,
    pub period: Period,
}

macro_rules! token_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $token),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = FigNameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($ty::$variant),)+
                    _ => Err(FigNameError::UnknownToken { field: $field, token: s.to_string() }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

token_enum!(ProductType, "type", {
    Clim => "clim",
    Mensual => "mensual",
    Estacional => "estacional",
});

token_enum!(Variable, "variable", {
    CapaMezcla => "capa-mezcla",
    NivelMar => "nivel-mar",
    Temperatura => "temperatura",
    Salinidad => "salinidad",
    Velocidad => "velocidad",
    Nitratos => "nitratos",
    Carbono => "carbono",
    Clorofila => "clorofila",
    CorrientesVectores => "corrientes-vectores",
});

token_enum!(Statistic, "statistic", {
    Media => "media",
    DesviacionEstandar => "desviacion-estandar",
    Maximos => "maximos",
    Minimos => "minimos",
    Promedio => "promedio",
});

token_enum!(Season, "season", {
    Invierno => "invierno",
    Primavera => "primavera",
    Otono => "otoño",
    Verano => "verano",
});

impl Variable {
    /// Vector products are drawn as quiver plots, everything else as pcolor.
    pub fn is_vector(&self) -> bool {
        matches!(self, Variable::CorrientesVectores)
    }
}

impl Season {
    /// Season name with an upper-case first letter, used for annotations
    pub fn label(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl FigureName {
    /// Parses a figure name following the project naming convention.
    ///
    /// # Errors
    ///
    /// Returns a [`FigNameError`] describing the first component that does not
    /// match the grammar.
    pub fn parse(figname: &str) -> Result<Self, FigNameError> {
        let stem = figname.strip_suffix(".png").unwrap_or(figname);
        let tokens: Vec<&str> = stem.split('_').collect();
        if tokens.len() < 4 {
            return Err(FigNameError::TooFewTokens(tokens.len()));
        }

        let id = tokens[0];
        if id.is_empty() {
            return Err(FigNameError::EmptyToken("id"));
        }
        let product: ProductType = tokens[1].parse()?;
        let variable: Variable = tokens[2].parse()?;
        let statistic: Statistic = tokens[3].parse()?;

        let mut rest = tokens[4..].iter().copied().peekable();
        let (depth, period) = match product {
            ProductType::Clim => {
                let depth = take_depth(&mut rest);
                (depth, Period::All)
            }
            ProductType::Mensual => {
                let depth = take_depth(&mut rest);
                let token = rest.next().ok_or(FigNameError::MissingField("month"))?;
                (depth, Period::Month(parse_month(token)?))
            }
            ProductType::Estacional => {
                let token = rest.next().ok_or(FigNameError::MissingField("season"))?;
                let season: Season = token.parse()?;
                let depth = take_depth(&mut rest);
                (depth, Period::Season(season))
            }
        };

        let trailing: Vec<&str> = rest.collect();
        if !trailing.is_empty() {
            return Err(FigNameError::TrailingTokens(trailing.join("_")));
        }

        Ok(FigureName {
            id: id.to_string(),
            product,
            variable,
            statistic,
            depth,
            period,
        })
    }

    /// Title drawn above the map
    pub fn title(&self, units: Option<&str>) -> String {
        let mut title = format!("Climatología de {} ({})", self.variable, self.statistic);
        if let Some(depth) = self.depth {
            title.push_str(&format!(" a {} m", depth));
        }
        if let Some(units) = units.filter(|u| !u.is_empty()) {
            title.push_str(&format!(" [{}]", units));
        }
        title
    }

    /// Month or season label placed inside the axes, if any
    pub fn annotation(&self) -> Option<String> {
        match self.period {
            Period::All => None,
            Period::Month(m) => month_name(m).map(str::to_string),
            Period::Season(s) => Some(s.label()),
        }
    }

    /// Period key used by the colormap configuration
    pub fn period_key(&self) -> String {
        match self.period {
            Period::All => "0".to_string(),
            Period::Month(m) => m.to_string(),
            Period::Season(s) => s.as_str().to_string(),
        }
    }

    /// Depth key used by the colormap configuration, `-1` when no depth is given
    pub fn depth_key(&self) -> String {
        match self.depth {
            Some(d) => d.to_string(),
            None => "-1".to_string(),
        }
    }

    /// Directory (relative to `root`) a figure is stored in: `<tipo>/<var>/<stat>`
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(self.product.as_str())
            .join(self.variable.as_str())
            .join(self.statistic.as_str())
    }

    pub fn file_name(&self) -> String {
        format!("{}.png", self)
    }
}

impl FromStr for FigureName {
    type Err = FigNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FigureName::parse(s)
    }
}

impl fmt::Display for FigureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.id, self.product, self.variable, self.statistic)?;
        let depth = self.depth.map(|d| format!("_{}m", d)).unwrap_or_default();
        match self.period {
            Period::All => write!(f, "{}", depth),
            Period::Month(m) => write!(f, "{}_M{:02}", depth, m),
            Period::Season(s) => write!(f, "_{}{}", s, depth),
        }
    }
}

/// Consumes the next token if it is a depth token (`<digits>m`)
fn take_depth<'a, I>(tokens: &mut std::iter::Peekable<I>) -> Option<u32>
where
    I: Iterator<Item = &'a str>,
{
    let depth = tokens.peek().and_then(|t| parse_depth(t))?;
    tokens.next();
    Some(depth)
}

fn parse_depth(token: &str) -> Option<u32> {
    let digits = token.strip_suffix('m')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_month(token: &str) -> Result<u8, FigNameError> {
    let invalid = || FigNameError::InvalidMonth(token.to_string());
    let rest = token.strip_prefix('M').ok_or_else(invalid)?;
    // the month is read from the first two characters, `M7` is July
    let digits: String = rest.chars().take(2).collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let month: u8 = digits.parse().map_err(|_| invalid())?;
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(invalid())
    }
}
