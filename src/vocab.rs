//! Fixed lookup tables shared by the figure pipeline.

use serde::Serialize;

use crate::figname::Variable;

/// NetCDF variable(s) holding the data of a figure variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NcSource {
    Scalar(String),
    Vector { u: String, v: String },
}

/// Default NetCDF variable for each figure variable.
///
/// Nutrient and carbon products have no counterpart in the current files.
pub fn default_source(variable: Variable) -> Option<NcSource> {
    let scalar = |name: &str| Some(NcSource::Scalar(name.to_string()));
    match variable {
        Variable::CapaMezcla => scalar("CapaMezcla"),
        Variable::NivelMar => scalar("ssh"),
        Variable::Temperatura => scalar("pot_temp"),
        Variable::Salinidad => scalar("salinity"),
        Variable::Velocidad => scalar("speed"),
        Variable::Nitratos | Variable::Carbono | Variable::Clorofila => None,
        Variable::CorrientesVectores => Some(NcSource::Vector {
            u: "u".to_string(),
            v: "v".to_string(),
        }),
    }
}

const MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish month name for a 1-based month number
pub fn month_name(month: u8) -> Option<&'static str> {
    MONTHS.get(usize::from(month).checked_sub(1)?).copied()
}

/// Turns CF unit strings into what is printed on the figure
pub fn pretty_units(units: &str) -> String {
    match units.trim() {
        "degC" | "degree_Celsius" | "degrees_Celsius" | "Celsius" => "°C".to_string(),
        "m s-1" | "m/s" | "m s^-1" => "m s⁻¹".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources() {
        assert_eq!(
            default_source(Variable::Temperatura),
            Some(NcSource::Scalar("pot_temp".to_string()))
        );
        assert_eq!(
            default_source(Variable::NivelMar),
            Some(NcSource::Scalar("ssh".to_string()))
        );
        assert_eq!(default_source(Variable::Clorofila), None);
        assert!(matches!(
            default_source(Variable::CorrientesVectores),
            Some(NcSource::Vector { .. })
        ));
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), Some("Enero"));
        assert_eq!(month_name(12), Some("Diciembre"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_pretty_units() {
        assert_eq!(pretty_units("degC"), "°C");
        assert_eq!(pretty_units("m/s"), "m s⁻¹");
        assert_eq!(pretty_units("psu"), "psu");
    }
}
