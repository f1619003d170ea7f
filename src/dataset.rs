//! # NetCDF Dataset Module
//!
//! Loads the 2D horizontal slices plotted by the figure pipeline. Climatology
//! files carry a leading time axis of length one and, for 3D fields, a depth
//! axis; the first time step is always used and the depth level is picked by
//! value.
//!
//! Fill values (`_FillValue`, `missing_value`) become `NaN` and CF packing
//! (`scale_factor`, `add_offset`) is undone, so downstream code only sees
//! physical values.

use log::{debug, warn};
use ndarray::{Array2, ArrayD, Axis, Ix2};
use std::path::{Path, PathBuf};

use crate::error::{ClimfigError, Result};
use crate::vocab::pretty_units;

const LON_NAMES: &[&str] = &["Longitude", "longitude", "lon"];
const LAT_NAMES: &[&str] = &["Latitude", "latitude", "lat"];
const DEPTH_NAMES: &[&str] = &["Depth", "depth"];

/// netCDF default fill values are around 9.97e36
const DEFAULT_FILL_THRESHOLD: f64 = 1e30;

/// A scalar field on a rectilinear lon/lat grid
#[derive(Debug, Clone)]
pub struct Field {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Values indexed `[lat, lon]`
    pub values: Array2<f64>,
    pub units: Option<String>,
}

/// A horizontal vector field on a rectilinear lon/lat grid
#[derive(Debug, Clone)]
pub struct VectorField {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub u: Array2<f64>,
    pub v: Array2<f64>,
    pub units: Option<String>,
}

impl Field {
    /// Finite minimum and maximum, `None` if every value is masked
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        finite_range(self.values.iter().copied())
    }
}

impl VectorField {
    /// Magnitude of the vectors, NaN where either component is masked
    pub fn speed(&self) -> Array2<f64> {
        let mut speed = self.u.clone();
        speed.zip_mut_with(&self.v, |u, v| *u = u.hypot(*v));
        speed
    }
}

pub fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

pub struct ClimDataset {
    path: PathBuf,
    file: netcdf::File,
}

impl ClimDataset {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening NetCDF file: {}", path.display());
        let file = netcdf::open(&path)?;
        Ok(ClimDataset { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name().to_string()).collect()
    }

    /// Longitude and latitude axes. 2D coordinates are assumed rectilinear and
    /// reduced to their first row / column. Longitudes given as 180..360 are
    /// shifted to -180..0.
    pub fn coordinates(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        let lon = self.read_axis(LON_NAMES, Axis(0))?;
        let lat = self.read_axis(LAT_NAMES, Axis(1))?;
        let lon = if lon.iter().all(|l| *l >= 180.0) {
            debug!("Shifting longitudes from 0..360 to -180..180");
            lon.into_iter().map(|l| l - 360.0).collect()
        } else {
            lon
        };
        Ok((lon, lat))
    }

    fn read_axis(&self, names: &[&str], reduce: Axis) -> Result<Vec<f64>> {
        let var = names
            .iter()
            .find_map(|n| self.file.variable(n))
            .ok_or_else(|| ClimfigError::CoordinateNotFound(names.join(", ")))?;
        let values = var.get::<f64, _>(..)?;
        match values.ndim() {
            1 => Ok(values.iter().copied().collect()),
            2 => {
                warn!("2D coordinate '{}' reduced to 1D, grid assumed rectilinear", var.name());
                Ok(values.index_axis(reduce, 0).iter().copied().collect())
            }
            n => Err(ClimfigError::InvalidShape(format!(
                "coordinate '{}' has {} dimensions",
                var.name(),
                n
            ))),
        }
    }

    /// Depth axis values, `None` for files without one
    pub fn depth_axis(&self) -> Result<Option<Vec<f64>>> {
        match DEPTH_NAMES.iter().find_map(|n| self.file.variable(n)) {
            Some(var) => {
                let values = var.get::<f64, _>(..)?;
                Ok(Some(values.iter().copied().collect()))
            }
            None => Ok(None),
        }
    }

    /// Index of the requested depth in the depth axis.
    ///
    /// Files without a depth axis yield `None`. A figure without depth uses
    /// the first level.
    pub fn depth_index(&self, depth: Option<u32>) -> Result<Option<usize>> {
        let axis = match self.depth_axis()? {
            Some(axis) => axis,
            None => {
                if let Some(d) = depth {
                    warn!("{} has no depth axis, ignoring depth {} m", self.path.display(), d);
                }
                return Ok(None);
            }
        };
        match depth {
            Some(d) => axis
                .iter()
                .position(|z| (z - d as f64).abs() < 1e-3)
                .map(Some)
                .ok_or(ClimfigError::DepthNotFound(d)),
            None => {
                debug!("No depth requested, using the first level ({:?} m)", axis.first());
                Ok(Some(0))
            }
        }
    }

    /// Reads a `[lat, lon]` slice of `name` at the first time step.
    pub fn read_slice(&self, name: &str, depth_index: Option<usize>) -> Result<Array2<f64>> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| ClimfigError::VariableNotFound(name.to_string()))?;
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
        let raw: ArrayD<f64> = var.get::<f64, _>(..)?;
        debug!("Variable {} dims {:?} shape {:?}", name, dims, raw.shape());

        let has_depth_dim = dims.iter().any(|d| DEPTH_NAMES.contains(&d.as_str()));
        let slice = match raw.ndim() {
            2 => raw,
            3 if has_depth_dim => raw.index_axis_move(Axis(0), depth_index.unwrap_or(0)),
            3 => raw.index_axis_move(Axis(0), 0),
            4 => raw
                .index_axis_move(Axis(0), 0)
                .index_axis_move(Axis(0), depth_index.unwrap_or(0)),
            n => {
                return Err(ClimfigError::InvalidShape(format!(
                    "variable '{}' has {} dimensions, expected 2 to 4",
                    name, n
                )));
            }
        };
        let mut slice = slice
            .into_dimensionality::<Ix2>()
            .map_err(|e| ClimfigError::InvalidShape(e.to_string()))?;

        let fill = attr_f64(&var, "_FillValue");
        let missing = attr_f64(&var, "missing_value");
        let scale = attr_f64(&var, "scale_factor").unwrap_or(1.0);
        let offset = attr_f64(&var, "add_offset").unwrap_or(0.0);
        slice.mapv_inplace(|x| {
            if Some(x) == fill || Some(x) == missing || x.abs() >= DEFAULT_FILL_THRESHOLD {
                f64::NAN
            } else {
                x * scale + offset
            }
        });
        Ok(slice)
    }

    pub fn units(&self, name: &str) -> Option<String> {
        let var = self.file.variable(name)?;
        match var.attribute("units")?.value().ok()? {
            netcdf::AttributeValue::Str(s) => Some(pretty_units(&s)),
            netcdf::AttributeValue::Strs(v) => v.first().map(|s| pretty_units(s)),
            _ => None,
        }
    }

    /// Loads a scalar field at the given depth
    pub fn load_scalar(&self, name: &str, depth: Option<u32>) -> Result<Field> {
        let (lon, lat) = self.coordinates()?;
        let idx = self.depth_index(depth)?;
        let values = orient(self.read_slice(name, idx)?, &lon, &lat, name)?;
        Ok(Field {
            lon,
            lat,
            values,
            units: self.units(name),
        })
    }

    /// Loads the two components of a vector field at the given depth
    pub fn load_vector(&self, u_name: &str, v_name: &str, depth: Option<u32>) -> Result<VectorField> {
        let (lon, lat) = self.coordinates()?;
        let idx = self.depth_index(depth)?;
        let u = orient(self.read_slice(u_name, idx)?, &lon, &lat, u_name)?;
        let v = orient(self.read_slice(v_name, idx)?, &lon, &lat, v_name)?;
        Ok(VectorField {
            lon,
            lat,
            u,
            v,
            units: self.units(u_name),
        })
    }

    pub fn close(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}

/// Makes sure a slice is indexed `[lat, lon]`
fn orient(values: Array2<f64>, lon: &[f64], lat: &[f64], name: &str) -> Result<Array2<f64>> {
    let shape = values.dim();
    if shape == (lat.len(), lon.len()) {
        Ok(values)
    } else if shape == (lon.len(), lat.len()) {
        debug!("Transposing {} from [lon, lat] to [lat, lon]", name);
        Ok(values.reversed_axes())
    } else {
        Err(ClimfigError::InvalidShape(format!(
            "variable '{}' has shape {:?}, grid is {} lat x {} lon",
            name,
            shape,
            lat.len(),
            lon.len()
        )))
    }
}

fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    use netcdf::AttributeValue as V;
    match var.attribute(name)?.value().ok()? {
        V::Double(x) => Some(x),
        V::Float(x) => Some(x as f64),
        V::Int(x) => Some(x as f64),
        V::Uint(x) => Some(x as f64),
        V::Short(x) => Some(x as f64),
        V::Ushort(x) => Some(x as f64),
        V::Schar(x) => Some(x as f64),
        V::Uchar(x) => Some(x as f64),
        V::Longlong(x) => Some(x as f64),
        V::Ulonglong(x) => Some(x as f64),
        V::Doubles(v) => v.first().copied(),
        V::Floats(v) => v.first().map(|x| *x as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures;
    use tempfile::tempdir;

    #[test]
    fn test_coordinates_and_depth_axis() {
        let dir = tempdir().unwrap();
        let path = fixtures::scalar_3d(dir.path());
        let ds = ClimDataset::open(&path).unwrap();

        let (lon, lat) = ds.coordinates().unwrap();
        assert_eq!(lon.len(), fixtures::NLON);
        assert_eq!(lat.len(), fixtures::NLAT);
        assert_eq!(lon[0], -98.0);
        assert_eq!(lat[0], 18.0);

        assert_eq!(ds.depth_axis().unwrap(), Some(fixtures::DEPTHS.to_vec()));
        assert_eq!(ds.depth_index(Some(100)).unwrap(), Some(2));
        assert_eq!(ds.depth_index(None).unwrap(), Some(0));
        assert!(matches!(
            ds.depth_index(Some(7)),
            Err(ClimfigError::DepthNotFound(7))
        ));
    }

    #[test]
    fn test_load_scalar_selects_depth_and_masks_fill() {
        let dir = tempdir().unwrap();
        let path = fixtures::scalar_3d(dir.path());
        let ds = ClimDataset::open(&path).unwrap();

        let field = ds.load_scalar("pot_temp", Some(100)).unwrap();
        assert_eq!(field.values.dim(), (fixtures::NLAT, fixtures::NLON));
        assert_eq!(field.units.as_deref(), Some("°C"));
        // value = depth index * 100 + lat index * 10 + lon index
        assert_eq!(field.values[[1, 2]], 212.0);
        // land corner written as fill value
        assert!(field.values[[0, 0]].is_nan());
        assert_eq!(field.finite_range(), Some((201.0, 200.0 + 10.0 * (fixtures::NLAT - 1) as f64 + (fixtures::NLON - 1) as f64)));
    }

    #[test]
    fn test_load_surface_field_without_depth_axis() {
        let dir = tempdir().unwrap();
        let path = fixtures::surface(dir.path());
        let ds = ClimDataset::open(&path).unwrap();
        assert_eq!(ds.depth_axis().unwrap(), None);

        let field = ds.load_scalar("ssh", None).unwrap();
        assert_eq!(field.values.dim(), (fixtures::NLAT, fixtures::NLON));
        // packed as short with scale_factor 0.01
        assert!((field.values[[2, 3]] - 0.23).abs() < 1e-9);
        assert_eq!(field.units.as_deref(), Some("m"));
    }

    #[test]
    fn test_depth_ignored_without_depth_axis() {
        let dir = tempdir().unwrap();
        let path = fixtures::surface(dir.path());
        let ds = ClimDataset::open(&path).unwrap();

        assert_eq!(ds.depth_index(Some(100)).unwrap(), None);
        let at_depth = ds.load_scalar("ssh", Some(100)).unwrap();
        let surface = ds.load_scalar("ssh", None).unwrap();
        assert_eq!(at_depth.values, surface.values);
    }

    #[test]
    fn test_load_vector() {
        let dir = tempdir().unwrap();
        let path = fixtures::currents(dir.path());
        let ds = ClimDataset::open(&path).unwrap();

        let vectors = ds.load_vector("u", "v", Some(10)).unwrap();
        assert_eq!(vectors.u.dim(), (fixtures::NLAT, fixtures::NLON));
        let speed = vectors.speed();
        assert!((speed[[0, 0]] - 0.5).abs() < 1e-6);
        assert_eq!(vectors.units.as_deref(), Some("m s⁻¹"));
    }

    #[test]
    fn test_missing_variable() {
        let dir = tempdir().unwrap();
        let path = fixtures::surface(dir.path());
        let ds = ClimDataset::open(&path).unwrap();
        assert!(matches!(
            ds.load_scalar("salinity", None),
            Err(ClimfigError::VariableNotFound(_))
        ));
        assert!(!ds.has_variable("salinity"));
        assert!(ds.has_variable("ssh"));
    }

    #[test]
    fn test_open_missing_file() {
        assert!(ClimDataset::open("does/not/exist.nc").is_err());
    }
}
