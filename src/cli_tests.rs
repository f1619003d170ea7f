//! # CLI Tests
//!
//! Argument parsing for every subcommand, flag overrides and error cases.

#[cfg(test)]
mod tests {
    use clap::Parser;
    use clap_complete::Shell;
    use std::path::PathBuf;

    use crate::cli::{Cli, Commands, ConfigFormat, OutputFormat, TemplateType};
    use crate::colormap::Normalization;
    use crate::config::{ColorbarOrientation, LandDataset, RenderConfig};
    use crate::style::StyleOverrides;

    #[test]
    fn test_cli_help() {
        let result = Cli::try_parse_from(["climfig", "--help"]);
        assert!(result.is_err());

        let error = result.unwrap_err();
        assert!(error.to_string().contains("static map figures"));
    }

    #[test]
    fn test_plot_help_mentions_canonical_file_name() {
        let error = Cli::try_parse_from(["climfig", "plot", "--help"]).unwrap_err();
        let help = error.to_string();
        assert!(help.contains("canonical form of the name"));
        assert!(help.contains("F1_mensual_temperatura_media_100m_M07.png"));
    }

    #[test]
    fn test_cli_version() {
        let result = Cli::try_parse_from(["climfig", "--version"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "climfig",
            "--verbose",
            "--output-format",
            "json",
            "--config",
            "/path/to/render.yaml",
            "parse",
            "F1_clim_temperatura_media",
        ]);

        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/render.yaml")));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["climfig", "parse", "F1_clim_temperatura_media", "-q"]);
        assert!(cli.quiet);
        assert_eq!(cli.output_format, OutputFormat::Human);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["climfig", "-v", "-q", "parse", "F1_clim_temperatura_media"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_plot_command_basic() {
        let cli = Cli::parse_from([
            "climfig",
            "plot",
            "F1_clim_temperatura_media_100m",
            "clim_temperatura.nc",
        ]);

        if let Commands::Plot {
            figname,
            input,
            render,
            style,
            dry_run,
        } = &cli.command
        {
            assert_eq!(figname, "F1_clim_temperatura_media_100m");
            assert_eq!(input, &PathBuf::from("clim_temperatura.nc"));
            assert_eq!(render.dpi, None);
            assert_eq!(render.output_root, None);
            assert_eq!(style.cmap, None);
            assert!(!*dry_run);
        } else {
            panic!("Expected Plot command");
        }
    }

    #[test]
    fn test_plot_command_overrides() {
        let cli = Cli::parse_from([
            "climfig",
            "plot",
            "F5_clim_clorofila_promedio",
            "chl.nc",
            "--cmap",
            "YlGnBu",
            "--vmin=-1.5",
            "--vmax",
            "10",
            "--norm",
            "log",
            "--dpi",
            "150",
            "--style-config",
            "styles.json",
            "--output-root",
            "out",
            "--colorbar",
            "vertical",
            "--land",
            "natural-earth",
            "--no-bathy",
            "--extent=-98,-77,18,32",
            "--dry-run",
        ]);

        let Commands::Plot {
            render,
            style,
            dry_run,
            ..
        } = &cli.command
        else {
            panic!("Expected Plot command");
        };
        assert!(*dry_run);

        let overrides = StyleOverrides::from(style);
        assert_eq!(overrides.cmap.as_deref(), Some("YlGnBu"));
        assert_eq!(overrides.vmin, Some(-1.5));
        assert_eq!(overrides.vmax, Some(10.0));
        assert_eq!(overrides.norm, Some(Normalization::Log));

        let mut config = RenderConfig::default();
        render.apply(&mut config);
        assert_eq!(config.dpi, 150);
        assert_eq!(config.style_config, PathBuf::from("styles.json"));
        assert_eq!(config.output_root, PathBuf::from("out"));
        assert_eq!(config.colorbar_orientation, ColorbarOrientation::Vertical);
        assert_eq!(config.land_dataset, LandDataset::NaturalEarth);
        assert!(!config.plot_bathy);
        assert_eq!(config.extent, Some([-98.0, -77.0, 18.0, 32.0]));
    }

    #[test]
    fn test_plot_invalid_values() {
        let base = ["climfig", "plot", "F1_clim_temperatura_media", "t.nc"];

        let with = |extra: &[&'static str]| {
            let mut args: Vec<&str> = base.to_vec();
            args.extend_from_slice(extra);
            Cli::try_parse_from(args)
        };
        assert!(with(&["--norm", "sqrt"]).is_err());
        assert!(with(&["--dpi", "high"]).is_err());
        assert!(with(&["--extent", "1,2,3"]).is_err());
        assert!(with(&["--colorbar", "diagonal"]).is_err());
        assert!(Cli::try_parse_from(["climfig", "plot", "F1_clim_temperatura_media"]).is_err());
    }

    #[test]
    fn test_batch_command() {
        let cli = Cli::parse_from([
            "climfig",
            "batch",
            "figures.txt",
            "--slice-interval",
            "4",
            "--no-land",
            "--fail-fast",
        ]);

        if let Commands::Batch {
            list,
            render,
            fail_fast,
            ..
        } = &cli.command
        {
            assert_eq!(list, &PathBuf::from("figures.txt"));
            assert_eq!(render.slice_interval, Some(4));
            assert!(render.no_land);
            assert!(*fail_fast);
        } else {
            panic!("Expected Batch command");
        }
    }

    #[test]
    fn test_info_command() {
        let cli = Cli::parse_from(["climfig", "info", "currents.nc", "--detailed", "-n", "u"]);

        if let Commands::Info {
            file,
            detailed,
            variable,
        } = &cli.command
        {
            assert_eq!(file, &PathBuf::from("currents.nc"));
            assert!(*detailed);
            assert_eq!(variable.as_deref(), Some("u"));
        } else {
            panic!("Expected Info command");
        }
    }

    #[test]
    fn test_template_command() {
        let cli = Cli::parse_from(["climfig", "template", "render", "--format", "yaml", "-o", "render.yaml"]);

        if let Commands::Template {
            template_type,
            output,
            format,
        } = &cli.command
        {
            assert_eq!(template_type, &TemplateType::Render);
            assert_eq!(output, &Some(PathBuf::from("render.yaml")));
            assert_eq!(format, &ConfigFormat::Yaml);
        } else {
            panic!("Expected Template command");
        }

        let cli = Cli::parse_from(["climfig", "template", "style"]);
        if let Commands::Template {
            template_type,
            format,
            ..
        } = &cli.command
        {
            assert_eq!(template_type, &TemplateType::Style);
            assert_eq!(format, &ConfigFormat::Json);
        } else {
            panic!("Expected Template command");
        }

        assert!(Cli::try_parse_from(["climfig", "template", "nonsense"]).is_err());
    }

    #[test]
    fn test_completions_command() {
        let cli = Cli::parse_from(["climfig", "completions", "zsh", "-o", "_climfig"]);

        if let Commands::Completions { shell, output } = &cli.command {
            assert_eq!(*shell, Shell::Zsh);
            assert_eq!(output, &Some(PathBuf::from("_climfig")));
        } else {
            panic!("Expected Completions command");
        }
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(Cli::try_parse_from(["climfig"]).is_err());
    }
}
