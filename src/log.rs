use crate::FigurePlan;
use crate::config::RenderConfig;
use log::info;
use std::time::Duration;

pub fn show_greeting(figname: &str, input: &str) {
    info!("=== climfig ===");
    info!("Figure: {}", figname);
    info!("Input NetCDF: {}", input);
}

pub fn config_echo(config: &RenderConfig) {
    let (w, h) = config.pixel_size();
    info!("Configuration:");
    info!("  Output root: {}", config.output_root.display());
    info!("  Style config: {}", config.style_config.display());
    info!("  Page: {}x{} px at {} dpi", w, h, config.dpi);
    match config.extent {
        Some(e) => info!("  Extent: [{}, {}, {}, {}]", e[0], e[1], e[2], e[3]),
        None => info!("  Extent: data bounds"),
    }
    if config.plot_land {
        info!("  Land: {:?} from {}", config.land_dataset, config.features_dir.display());
    }
    if config.plot_bathy {
        info!("  Bathymetry: on");
    }
}

pub fn plan_echo(plan: &FigurePlan) {
    info!("Plan for {}:", plan.name);
    info!("  Source: {:?}", plan.source);
    match plan.depth {
        Some(d) => info!("  Depth: {} m", d),
        None => info!("  Depth: first level"),
    }
    info!(
        "  Style: {} ({:?}) [{}, {}]",
        plan.cmap,
        plan.norm,
        plan.vmin.map_or("data".to_string(), |v| v.to_string()),
        plan.vmax.map_or("data".to_string(), |v| v.to_string())
    );
    info!("  Output: {}", plan.output.display());
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    info!("=== Done in {:.2}s ===", elapsed.as_secs_f64());
}

pub fn show_batch_summary(done: usize, failed: usize, elapsed: Duration) {
    info!(
        "=== {} figures written, {} failed, {:.2}s ===",
        done,
        failed,
        elapsed.as_secs_f64()
    );
}
