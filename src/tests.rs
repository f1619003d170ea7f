use crate::config::{LandDataset, RenderConfig, SourceOverride};
use crate::error::ClimfigError;
use crate::style::{StyleEntry, StyleOverrides};
use crate::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// NetCDF files shaped like the climatology products, written on the fly
pub(crate) mod fixtures {
    use std::path::{Path, PathBuf};

    pub const NLON: usize = 8;
    pub const NLAT: usize = 6;
    pub const DEPTHS: [f64; 4] = [0.0, 10.0, 100.0, 500.0];

    fn lon() -> Vec<f64> {
        (0..NLON).map(|i| -98.0 + 3.0 * i as f64).collect()
    }

    fn lat() -> Vec<f64> {
        (0..NLAT).map(|j| 18.0 + 2.0 * j as f64).collect()
    }

    fn add_grid(file: &mut netcdf::FileMut, with_depth: bool) {
        file.add_dimension("time", 1).unwrap();
        file.add_dimension("Longitude", NLON).unwrap();
        file.add_dimension("Latitude", NLAT).unwrap();
        file.add_attribute("title", "climfig test climatology").unwrap();

        {
            let mut var = file.add_variable::<f64>("Longitude", &["Longitude"]).unwrap();
            var.put_attribute("units", "degrees_east").unwrap();
            var.put_values(&lon(), ..).unwrap();
        }
        {
            let mut var = file.add_variable::<f64>("Latitude", &["Latitude"]).unwrap();
            var.put_attribute("units", "degrees_north").unwrap();
            var.put_values(&lat(), ..).unwrap();
        }
        if with_depth {
            file.add_dimension("Depth", DEPTHS.len()).unwrap();
            let mut var = file.add_variable::<f64>("Depth", &["Depth"]).unwrap();
            var.put_attribute("units", "m").unwrap();
            var.put_values(&DEPTHS[..], ..).unwrap();
        }
    }

    /// `pot_temp(time, Depth, Latitude, Longitude)` as float with value
    /// `100 * depth index + 10 * lat index + lon index`; the south-west corner
    /// of every level holds the fill value.
    pub fn scalar_3d(dir: &Path) -> PathBuf {
        let path = dir.join("clim_temperatura.nc");
        let mut file = netcdf::create(&path).unwrap();
        add_grid(&mut file, true);

        let mut var = file
            .add_variable::<f32>("pot_temp", &["time", "Depth", "Latitude", "Longitude"])
            .unwrap();
        var.put_attribute("_FillValue", -999.0f32).unwrap();
        var.put_attribute("units", "degC").unwrap();
        let mut data = Vec::with_capacity(DEPTHS.len() * NLAT * NLON);
        for k in 0..DEPTHS.len() {
            for j in 0..NLAT {
                for i in 0..NLON {
                    let value = if i == 0 && j == 0 {
                        -999.0
                    } else {
                        (100 * k + 10 * j + i) as f32
                    };
                    data.push(value);
                }
            }
        }
        var.put_values(&data, ..).unwrap();
        path
    }

    /// `ssh(time, Latitude, Longitude)` packed as short with a 0.01 scale factor,
    /// unpacked value `(10 * lat index + lon index) / 100`; no depth axis.
    pub fn surface(dir: &Path) -> PathBuf {
        let path = dir.join("clim_ssh.nc");
        let mut file = netcdf::create(&path).unwrap();
        add_grid(&mut file, false);

        let mut var = file
            .add_variable::<i16>("ssh", &["time", "Latitude", "Longitude"])
            .unwrap();
        var.put_attribute("scale_factor", 0.01f64).unwrap();
        var.put_attribute("units", "m").unwrap();
        let data: Vec<i16> = (0..NLAT)
            .flat_map(|j| (0..NLON).map(move |i| (10 * j + i) as i16))
            .collect();
        var.put_values(&data, ..).unwrap();
        path
    }

    /// `u` and `v` of 0.3 and 0.4 m/s everywhere, on the depth grid
    pub fn currents(dir: &Path) -> PathBuf {
        let path = dir.join("clim_corrientes.nc");
        let mut file = netcdf::create(&path).unwrap();
        add_grid(&mut file, true);

        for (name, value) in [("u", 0.3f32), ("v", 0.4f32)] {
            let mut var = file
                .add_variable::<f32>(name, &["time", "Depth", "Latitude", "Longitude"])
                .unwrap();
            var.put_attribute("units", "m s-1").unwrap();
            var.put_values(&vec![value; DEPTHS.len() * NLAT * NLON], ..).unwrap();
        }
        path
    }
}

/// Small, quick render configuration writing under `root`
fn test_config(root: &Path) -> RenderConfig {
    RenderConfig {
        output_root: root.join("Figuras"),
        style_config: root.join("config_plot.json"),
        figure_size: [3.0, 3.0],
        dpi: 50,
        features_dir: root.join("features"),
        ..Default::default()
    }
}

fn job(figname: &str, input: &Path, render: RenderConfig) -> PlotJob {
    PlotJob {
        figname: figname.to_string(),
        input: input.to_path_buf(),
        render,
        overrides: StyleOverrides::default(),
    }
}

const STYLES: &str = r#"
{
    "temperatura": {
        "0": { "100": { "media": { "cmap": "jet", "vmin": 200.0, "vmax": 260.0 } } },
        "3": { "10": { "media": { "cmap": "RdBu_r" } } }
    },
    "nivel-mar": {
        "verano": { "-1": { "promedio": { "cmap": "coolwarm", "vmin": -0.5, "vmax": 0.5 } } }
    }
}"#;

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn test_plot_clim_pcolor() {
        let dir = tempdir().unwrap();
        let input = fixtures::scalar_3d(dir.path());
        let config = test_config(dir.path());
        fs::write(&config.style_config, STYLES).unwrap();

        let path = plot_figure(&job("F1_clim_temperatura_media_100m", &input, config)).unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("Figuras/clim/temperatura/media/F1_clim_temperatura_media_100m.png")
        );
        assert!(path.is_file());
        let img = image::open(&path).unwrap();
        assert!(img.width() > 10 && img.height() > 10);
    }

    #[test]
    fn test_plot_paints_mask_and_style_colors() {
        let dir = tempdir().unwrap();
        let input = fixtures::scalar_3d(dir.path());
        let config = test_config(dir.path());
        fs::write(&config.style_config, STYLES).unwrap();

        // lowest valid cell at 100 m is 201
        let mut j = job("F1_clim_temperatura_media_100m", &input, config);
        j.overrides.vmin = Some(201.0);
        let path = plot_figure(&j).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();

        let jet = colormap::Colormap::by_name("jet").unwrap();
        let viridis = colormap::Colormap::by_name("viridis").unwrap();
        let count = |color: image::Rgba<u8>| img.pixels().filter(|p| **p == color).count();
        // at least part of the masked south-west cell
        assert!(count(canvas::LIGHT_GRAY) > 15);
        assert!(count(jet.sample(0.0)) > 0);
        assert_eq!(count(viridis.sample(0.5)), 0);
    }

    #[test]
    fn test_plot_monthly_and_seasonal() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        fs::write(&config.style_config, STYLES).unwrap();

        let temp = fixtures::scalar_3d(dir.path());
        let monthly = plot_figure(&job("F2_mensual_temperatura_media_10m_M03", &temp, config.clone()))
            .unwrap();
        assert!(monthly.ends_with("mensual/temperatura/media/F2_mensual_temperatura_media_10m_M03.png"));

        let ssh = fixtures::surface(dir.path());
        let seasonal = plot_figure(&job("F3_estacional_nivel-mar_promedio_verano.png", &ssh, config))
            .unwrap();
        assert!(seasonal.ends_with("estacional/nivel-mar/promedio/F3_estacional_nivel-mar_promedio_verano.png"));
        assert!(seasonal.is_file());
    }

    #[test]
    fn test_plot_currents_quiver() {
        let dir = tempdir().unwrap();
        let input = fixtures::currents(dir.path());
        let mut config = test_config(dir.path());
        config.quiver.slice_interval = 2;

        let path = plot_figure(&job("F4_clim_corrientes-vectores_media_10m", &input, config)).unwrap();
        assert!(path.ends_with("clim/corrientes-vectores/media/F4_clim_corrientes-vectores_media_10m.png"));
        assert!(path.is_file());
    }

    #[test]
    fn test_missing_style_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let input = fixtures::scalar_3d(dir.path());
        let config = test_config(dir.path());
        assert!(!config.style_config.exists());

        let plan = resolve_job(&job("F5_clim_temperatura_maximos", &input, config.clone())).unwrap();
        assert_eq!(plan.cmap, style::DEFAULT_CMAP);
        assert_eq!(plan.depth, None);
        assert!(plot_figure(&job("F5_clim_temperatura_maximos", &input, config)).is_ok());
    }

    #[test]
    fn test_resolve_job_applies_overrides_without_writing() {
        let dir = tempdir().unwrap();
        let input = fixtures::scalar_3d(dir.path());
        let config = test_config(dir.path());
        fs::write(&config.style_config, STYLES).unwrap();

        let mut j = job("F1_clim_temperatura_media_100m", &input, config.clone());
        j.overrides = StyleEntry {
            vmax: Some(250.0),
            ..Default::default()
        };
        let plan = resolve_job(&j).unwrap();
        assert_eq!(plan.cmap, "jet");
        assert_eq!(plan.vmin, Some(200.0));
        assert_eq!(plan.vmax, Some(250.0));
        assert_eq!(
            plan.source,
            vocab::NcSource::Scalar("pot_temp".to_string())
        );
        assert!(!config.output_root.exists());
    }

    #[test]
    fn test_variable_override_from_config() {
        let dir = tempdir().unwrap();
        let input = fixtures::surface(dir.path());
        let mut config = test_config(dir.path());
        config
            .variables
            .insert("temperatura".to_string(), SourceOverride::Scalar("ssh".to_string()));

        let path = plot_figure(&job("F6_clim_temperatura_media", &input, config)).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_feature_layers_are_drawn_when_present() {
        let dir = tempdir().unwrap();
        let input = fixtures::scalar_3d(dir.path());
        let mut config = test_config(dir.path());
        config.land_dataset = LandDataset::NaturalEarth;
        fs::create_dir_all(&config.features_dir).unwrap();
        fs::write(
            features::land_file(&config.features_dir, LandDataset::NaturalEarth),
            r#"{ "type": "Polygon", "coordinates": [[[-99, 27], [-90, 27], [-90, 31], [-99, 31], [-99, 27]]] }"#,
        )
        .unwrap();

        let path = plot_figure(&job("F7_clim_temperatura_media_0m", &input, config)).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_errors() {
        let dir = tempdir().unwrap();
        let input = fixtures::scalar_3d(dir.path());
        let config = test_config(dir.path());

        assert!(matches!(
            plot_figure(&job("F1_clim_temperatura", &input, config.clone())),
            Err(ClimfigError::FigName(_))
        ));
        assert!(matches!(
            plot_figure(&job("F1_clim_temperatura_media_7m", &input, config.clone())),
            Err(ClimfigError::DepthNotFound(7))
        ));
        assert!(matches!(
            plot_figure(&job("F1_clim_nitratos_media_0m", &input, config.clone())),
            Err(ClimfigError::UnmappedVariable(_))
        ));
        assert!(matches!(
            plot_figure(&job("F1_clim_salinidad_media_0m", &input, config.clone())),
            Err(ClimfigError::VariableNotFound(_))
        ));
        assert!(plot_figure(&job("F1_clim_temperatura_media_0m", &dir.path().join("nope.nc"), config.clone())).is_err());

        let mut bad = job("F1_clim_temperatura_media_0m", &input, config);
        bad.overrides.cmap = Some("not-a-colormap".to_string());
        assert!(matches!(plot_figure(&bad), Err(ClimfigError::UnknownColormap(_))));
    }
}
