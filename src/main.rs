use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, debug, error, info};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

use climfig::FigureRenderer;
use climfig::cli::{
    BatchEntry, Cli, Commands, ConfigFormat, OutputFormat, RenderArgs, StyleArgs, TemplateType,
    parse_batch_list,
};
use climfig::config::RenderConfig;
use climfig::figname::FigureName;
use climfig::info::{
    get_netcdf_info, print_file_info_csv, print_file_info_human, print_file_info_json,
    print_file_info_yaml,
};
use climfig::log::{
    config_echo, plan_echo, show_batch_summary, show_farewell_with_timing, show_greeting,
};
use climfig::style::{StyleConfig, StyleOverrides};

fn main() {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_env(Env::new().filter_or("RUST_LOG", "info"));
    if cli.verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if cli.quiet {
        builder.filter_level(LevelFilter::Error);
    }
    builder.format_timestamp_millis().init();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Plot {
            figname,
            input,
            render,
            style,
            dry_run,
        } => plot_command(&cli, figname, input, render, style, *dry_run),
        Commands::Batch {
            list,
            render,
            style,
            fail_fast,
        } => batch_command(&cli, list, render, style, *fail_fast),
        Commands::Parse { figname } => parse_command(&cli, figname),
        Commands::Info {
            file,
            detailed,
            variable,
        } => info_command(&cli, file, *detailed, variable.as_deref()),
        Commands::Template {
            template_type,
            output,
            format,
        } => template_command(template_type, output.as_deref(), format),
        Commands::Completions { shell, output } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            match output {
                Some(path) => {
                    let mut file = fs::File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    generate(*shell, &mut cmd, name, &mut file);
                    info!("Completions written to {}", path.display());
                }
                None => generate(*shell, &mut cmd, name, &mut io::stdout()),
            }
            Ok(())
        }
    }
}

/// Render configuration from the `--config` file (or defaults), then the flags.
fn load_render_config(path: Option<&Path>, args: &RenderArgs) -> Result<RenderConfig> {
    let mut config = match path {
        Some(path) => {
            debug!("Loading render configuration from {}", path.display());
            RenderConfig::from_file(path).with_context(|| {
                format!("Failed to load render configuration {}", path.display())
            })?
        }
        None => RenderConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid render configuration")?;
    Ok(config)
}

fn plot_command(
    cli: &Cli,
    figname: &str,
    input: &Path,
    render: &RenderArgs,
    style: &StyleArgs,
    dry_run: bool,
) -> Result<()> {
    let start = Instant::now();
    show_greeting(figname, &input.display().to_string());

    let config = load_render_config(cli.config.as_deref(), render)?;
    config_echo(&config);
    let renderer = FigureRenderer::new(config, StyleOverrides::from(style))?;

    if dry_run {
        let name = FigureName::parse(figname)?;
        let plan = renderer.plan(&name, input)?;
        plan_echo(&plan);
        match cli.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&plan)?),
            _ => info!("Dry run, nothing written"),
        }
        return Ok(());
    }

    let path = renderer
        .plot(figname, input)
        .with_context(|| format!("Failed to draw {}", figname))?;
    if !cli.quiet {
        println!("{}", path.display());
    }
    show_farewell_with_timing(start.elapsed());
    Ok(())
}

fn batch_command(
    cli: &Cli,
    list: &Path,
    render: &RenderArgs,
    style: &StyleArgs,
    fail_fast: bool,
) -> Result<()> {
    let start = Instant::now();
    let content = fs::read_to_string(list)
        .with_context(|| format!("Failed to read batch list {}", list.display()))?;
    let entries: Vec<BatchEntry> = parse_batch_list(&content)
        .map_err(|e| anyhow::anyhow!("{}: {}", list.display(), e))?;
    info!("{} figures listed in {}", entries.len(), list.display());

    let config = load_render_config(cli.config.as_deref(), render)?;
    config_echo(&config);
    let renderer = FigureRenderer::new(config, StyleOverrides::from(style))?;

    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(entries.len() as u64)
    };
    pb.set_style(
        ProgressStyle::with_template(
            "{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("#>-"),
    );
    pb.set_prefix("Figures");

    let mut done = 0;
    let mut failed = Vec::new();
    for entry in &entries {
        pb.set_message(entry.figname.clone());
        match renderer.plot(&entry.figname, &entry.input) {
            Ok(path) => {
                done += 1;
                debug!("{} -> {}", entry.figname, path.display());
            }
            Err(e) => {
                pb.suspend(|| error!("line {}: {}: {}", entry.line, entry.figname, e));
                failed.push(entry.figname.clone());
                if fail_fast {
                    break;
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    show_batch_summary(done, failed.len(), start.elapsed());
    if !failed.is_empty() {
        bail!("{} figure(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

fn parse_command(cli: &Cli, figname: &str) -> Result<()> {
    let name = FigureName::parse(figname)?;
    match cli.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&name)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&name)?),
        OutputFormat::Human | OutputFormat::Csv => {
            println!("Figure: {}", name);
            println!("  Id: {}", name.id);
            println!("  Product: {}", name.product);
            println!("  Variable: {}", name.variable);
            println!("  Statistic: {}", name.statistic);
            match name.depth {
                Some(d) => println!("  Depth: {} m", d),
                None => println!("  Depth: none"),
            }
            println!("  Period key: {}", name.period_key());
            println!("  Title: {}", name.title(None));
            if let Some(annotation) = name.annotation() {
                println!("  Annotation: {}", annotation);
            }
            println!("  File: {}", name.file_name());
        }
    }
    Ok(())
}

fn info_command(cli: &Cli, file: &Path, detailed: bool, variable: Option<&str>) -> Result<()> {
    let config = load_render_config(cli.config.as_deref(), &RenderArgs::default())?;
    let path = file
        .to_str()
        .with_context(|| format!("Non UTF-8 path: {}", file.display()))?;
    let info = get_netcdf_info(path, variable, detailed, &config)?;
    match cli.output_format {
        OutputFormat::Human => print_file_info_human(&info),
        OutputFormat::Json => print_file_info_json(&info)?,
        OutputFormat::Yaml => print_file_info_yaml(&info)?,
        OutputFormat::Csv => print_file_info_csv(&info)?,
    }
    Ok(())
}

fn template_command(
    template_type: &TemplateType,
    output: Option<&Path>,
    format: &ConfigFormat,
) -> Result<()> {
    let text = match (template_type, format) {
        (TemplateType::Style, ConfigFormat::Json) => {
            serde_json::to_string_pretty(&StyleConfig::template())?
        }
        (TemplateType::Style, ConfigFormat::Yaml) => {
            bail!("The colormap configuration is read as JSON only, use --format json")
        }
        (TemplateType::Render, ConfigFormat::Json) => {
            serde_json::to_string_pretty(&RenderConfig::template())?
        }
        (TemplateType::Render, ConfigFormat::Yaml) => {
            serde_yaml::to_string(&RenderConfig::template())?
        }
    };
    match output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write template {}", path.display()))?;
            info!("Template written to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
