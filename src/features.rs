//! # Map Feature Layers
//!
//! Land, coastline and bathymetry layers read from GeoJSON files in the
//! configured features directory:
//!
//! | layer         | file                                   | drawn as                 |
//! |---------------|----------------------------------------|--------------------------|
//! | GSHHS land    | `gshhs_f_l1.geojson`                   | light gray, black edge   |
//! | Natural Earth | `ne_10m_land.geojson`                  | light gray               |
//! | coastline     | `ne_10m_coastline.geojson`             | black lines              |
//! | bathymetry    | `ne_10m_bathymetry_<level>.geojson`    | gray outlines            |
//!
//! A missing layer file is reported and skipped; the figure is still produced.

use geojson::{GeoJson, Geometry, Value};
use image::RgbaImage;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::canvas::{self, BLACK, GRAY, LIGHT_GRAY};
use crate::config::LandDataset;
use crate::error::Result;
use crate::map::Projection;

/// Natural Earth bathymetry levels drawn on the maps, shallowest first
pub const BATHYMETRY_LEVELS: &[&str] = &["K_200", "J_1000", "I_2000", "H_3000", "G_4000", "F_5000"];

type Ring = Vec<(f64, f64)>;

/// Polygons (exterior rings) and lines of a GeoJSON document, in lon/lat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureLayer {
    pub polygons: Vec<Ring>,
    pub lines: Vec<Ring>,
}

impl FeatureLayer {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_geojson_str(&content)
    }

    pub fn from_geojson_str(s: &str) -> Result<Self> {
        let geojson = s.parse::<GeoJson>()?;
        let mut layer = FeatureLayer::default();
        match geojson {
            GeoJson::FeatureCollection(collection) => {
                for feature in collection.features {
                    if let Some(geometry) = feature.geometry {
                        layer.add_geometry(&geometry);
                    }
                }
            }
            GeoJson::Feature(feature) => {
                if let Some(geometry) = feature.geometry {
                    layer.add_geometry(&geometry);
                }
            }
            GeoJson::Geometry(geometry) => layer.add_geometry(&geometry),
        }
        Ok(layer)
    }

    fn add_geometry(&mut self, geometry: &Geometry) {
        match &geometry.value {
            Value::Polygon(rings) => self.add_polygon(rings),
            Value::MultiPolygon(polygons) => {
                for rings in polygons {
                    self.add_polygon(rings);
                }
            }
            Value::LineString(line) => self.lines.push(to_ring(line)),
            Value::MultiLineString(lines) => self.lines.extend(lines.iter().map(|l| to_ring(l))),
            Value::GeometryCollection(geometries) => {
                for g in geometries {
                    self.add_geometry(g);
                }
            }
            _ => {}
        }
    }

    fn add_polygon(&mut self, rings: &[Vec<Vec<f64>>]) {
        // interior rings (lakes) are not drawn
        if let Some(exterior) = rings.first() {
            self.polygons.push(to_ring(exterior));
        }
    }

    /// Fills every polygon overlapping the projection extent, optionally outlining it
    pub fn fill(
        &self,
        img: &mut RgbaImage,
        proj: &Projection,
        face: image::Rgba<u8>,
        edge: Option<(f32, image::Rgba<u8>)>,
    ) {
        for ring in self.polygons.iter().filter(|r| visible(r, proj)) {
            let points = project_ring(ring, proj);
            canvas::fill_polygon(img, &points, face);
            if let Some((width, color)) = edge {
                canvas::polyline(img, &points, width, color);
            }
        }
    }

    /// Strokes every line, and every polygon outline, overlapping the projection extent
    pub fn stroke(&self, img: &mut RgbaImage, proj: &Projection, width: f32, color: image::Rgba<u8>) {
        for ring in self
            .polygons
            .iter()
            .chain(self.lines.iter())
            .filter(|r| visible(r, proj))
        {
            canvas::polyline(img, &project_ring(ring, proj), width, color);
        }
    }
}

fn to_ring(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}

fn bbox(ring: &Ring) -> Option<[f64; 4]> {
    ring.iter().fold(None, |acc, &(lon, lat)| {
        Some(match acc {
            None => [lon, lon, lat, lat],
            Some([x0, x1, y0, y1]) => [x0.min(lon), x1.max(lon), y0.min(lat), y1.max(lat)],
        })
    })
}

fn visible(ring: &Ring, proj: &Projection) -> bool {
    bbox(ring).is_some_and(|b| proj.intersects(b))
}

fn project_ring(ring: &Ring, proj: &Projection) -> Vec<(f32, f32)> {
    ring.iter().map(|&(lon, lat)| proj.project(lon, lat)).collect()
}

/// File holding the land layer of `dataset`
pub fn land_file(dir: &Path, dataset: LandDataset) -> PathBuf {
    dir.join(match dataset {
        LandDataset::Gshhs => "gshhs_f_l1.geojson",
        LandDataset::NaturalEarth => "ne_10m_land.geojson",
        LandDataset::Coastline => "ne_10m_coastline.geojson",
    })
}

pub fn bathymetry_files(dir: &Path) -> Vec<PathBuf> {
    BATHYMETRY_LEVELS
        .iter()
        .map(|level| dir.join(format!("ne_10m_bathymetry_{}.geojson", level)))
        .collect()
}

/// Loads a layer, warning and returning `None` when it is missing or unreadable
pub fn load_optional(path: &Path) -> Option<FeatureLayer> {
    if !path.is_file() {
        warn!("Feature layer {} not found, skipping", path.display());
        return None;
    }
    match FeatureLayer::from_file(path) {
        Ok(layer) => {
            debug!(
                "Loaded {} ({} polygons, {} lines)",
                path.display(),
                layer.polygons.len(),
                layer.lines.len()
            );
            Some(layer)
        }
        Err(e) => {
            warn!("Could not read feature layer {}: {}", path.display(), e);
            None
        }
    }
}

/// Draws the land layer of `dataset` onto the axes layer
pub fn draw_land(img: &mut RgbaImage, proj: &Projection, dir: &Path, dataset: LandDataset, dpi: f32) {
    let Some(layer) = load_optional(&land_file(dir, dataset)) else {
        return;
    };
    let px = |pt: f32| pt * dpi / 72.0;
    match dataset {
        LandDataset::Gshhs => layer.fill(img, proj, LIGHT_GRAY, Some((px(0.5), BLACK))),
        LandDataset::NaturalEarth => layer.fill(img, proj, LIGHT_GRAY, None),
        LandDataset::Coastline => layer.stroke(img, proj, px(0.5), BLACK),
    }
}

/// Draws the bathymetry contours onto the axes layer
pub fn draw_bathymetry(img: &mut RgbaImage, proj: &Projection, dir: &Path, dpi: f32) {
    for path in bathymetry_files(dir) {
        if let Some(layer) = load_optional(&path) {
            layer.stroke(img, proj, 0.5 * dpi / 72.0, GRAY);
        }
    }
}
