use clap::{ArgAction, Parser, Subcommand};
use shotframe::config::{self, ShotframeConfig};
use shotframe::editor::StaticEntitlement;
use shotframe::imaging::{
    AspectRatio, BackgroundType, EditingParameters, GradientId, NormalizedRect, SolidId,
    plan_layout,
};
use shotframe::{export, output};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Edit flags shared by every command that renders. Each one overrides the
/// matching config value.
#[derive(clap::Args, Clone, Debug, Default)]
struct EditArgs {
    /// Crop rectangle in normalized coordinates, top-left origin
    #[arg(long, value_name = "X,Y,W,H", allow_hyphen_values = true)]
    crop: Option<NormalizedRect>,

    /// Corner radius in source pixels
    #[arg(long)]
    corner_radius: Option<f32>,

    /// Padding on every side, in output pixels
    #[arg(long)]
    padding: Option<f32>,

    /// Enable the drop shadow
    #[arg(long)]
    shadow: bool,

    /// Shadow blur sigma in pixels (at most 500)
    #[arg(long)]
    shadow_blur: Option<f32>,

    /// Shadow opacity, 0 to 1
    #[arg(long)]
    shadow_opacity: Option<f32>,

    /// Shadow offset in pixels
    #[arg(long, value_name = "X,Y", value_parser = parse_offset, allow_hyphen_values = true)]
    shadow_offset: Option<(f32, f32)>,

    /// Canvas aspect ratio: free, square, portrait, landscape (or 1:1, 9:16, 16:9)
    #[arg(long)]
    aspect: Option<AspectRatio>,

    /// Canvas fill type: solid or gradient
    #[arg(long)]
    background: Option<BackgroundType>,

    /// Solid background colour (implies --background solid)
    #[arg(long, value_name = "NAME")]
    solid: Option<SolidId>,

    /// Background gradient (implies --background gradient)
    #[arg(long, value_name = "NAME")]
    gradient: Option<GradientId>,
}

impl EditArgs {
    fn apply(&self, mut params: EditingParameters) -> EditingParameters {
        if let Some(crop) = self.crop {
            params.crop_rect = crop;
        }
        if let Some(r) = self.corner_radius {
            params.corner_radius = r;
        }
        if let Some(p) = self.padding {
            params.padding = p;
        }
        if self.shadow {
            params.shadow.enabled = true;
        }
        if let Some(b) = self.shadow_blur {
            params.shadow.blur = b;
        }
        if let Some(o) = self.shadow_opacity {
            params.shadow.opacity = o;
        }
        if let Some(offset) = self.shadow_offset {
            params.shadow.offset = offset;
        }
        if let Some(a) = self.aspect {
            params.aspect_ratio = a;
        }
        if let Some(color) = self.solid {
            params.solid_color = color;
            params.background = BackgroundType::Solid;
        }
        if let Some(gradient) = self.gradient {
            params.gradient = gradient;
            params.background = BackgroundType::Gradient;
        }
        if let Some(bg) = self.background {
            params.background = bg;
        }
        params
    }
}

fn parse_offset(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("invalid offset {v:?}: {e}"))
    };
    Ok((parse(x)?, parse(y)?))
}

#[derive(Parser)]
#[command(name = "shotframe")]
#[command(about = "Frame screenshots: crop, round, pad, shadow and background")]
#[command(long_about = "\
Frame screenshots: crop, round, pad, shadow and background

Every render runs the same pipeline:

  crop → round corners → drop shadow → canvas (padding + aspect ratio)
       → background → centered composite → watermark (non-premium only)

Defaults come from shotframe.toml (see 'shotframe gen-config'); edit flags
override them per run.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export one image
    Render {
        input: PathBuf,
        /// Output file; the extension picks the format
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        edit: EditArgs,
        /// Export without the watermark
        #[arg(long)]
        premium: bool,
    },
    /// Export many images in parallel with the same settings
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory for the exported PNGs
        #[arg(long, default_value = "framed")]
        out_dir: PathBuf,
        #[command(flatten)]
        edit: EditArgs,
        /// Export without the watermark
        #[arg(long)]
        premium: bool,
    },
    /// Print the export geometry as JSON without rendering
    Plan {
        input: PathBuf,
        #[command(flatten)]
        edit: EditArgs,
    },
    /// List the named solid colours and gradients
    Palette,
    /// Print a stock shotframe.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Render {
            input,
            output,
            edit,
            premium,
        } => {
            let config = config::load_config(&cli.config)?;
            let params = edit.apply(config.editing_parameters());
            let report = export::export_file(&input, &output, &params, &entitlement(premium))?;
            output::print_export_report(&report);
        }
        Command::Batch {
            inputs,
            out_dir,
            edit,
            premium,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config);
            let params = edit.apply(config.editing_parameters());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_export_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary =
                export::export_batch(&inputs, &out_dir, &params, &entitlement(premium), Some(tx));
            printer.join().map_err(|_| "output thread panicked")?;
            output::print_batch_summary(&summary);
            if summary.failed > 0 {
                return Err(format!("{} of {} exports failed", summary.failed, inputs.len()).into());
            }
        }
        Command::Plan { input, edit } => {
            let config = config::load_config(&cli.config)?;
            let params = edit.apply(config.editing_parameters());
            let source = image::image_dimensions(&input)?;
            let plan = plan_layout(source, &params);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Palette => {
            output::print_palette();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn entitlement(premium: bool) -> StaticEntitlement {
    if premium {
        StaticEntitlement::premium()
    } else {
        StaticEntitlement::free()
    }
}

/// Log to stderr so stdout stays clean for `plan` JSON and `gen-config`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(config: &ShotframeConfig) {
    let threads = config::effective_threads(&config.processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_offset_accepts_negative_values() {
        assert_eq!(parse_offset("-3, 12.5"), Ok((-3.0, 12.5)));
        assert!(parse_offset("3").is_err());
        assert!(parse_offset("a,b").is_err());
    }

    #[test]
    fn edit_flags_override_base() {
        let cli = Cli::try_parse_from([
            "shotframe",
            "plan",
            "in.png",
            "--padding",
            "0",
            "--shadow",
            "--shadow-offset",
            "-2,4",
            "--aspect",
            "16:9",
            "--solid",
            "mint",
            "--crop",
            "0.1,0.1,0.5,0.5",
        ])
        .unwrap();
        let Command::Plan { edit, .. } = cli.command else {
            panic!("expected plan");
        };
        let params = edit.apply(EditingParameters::default());
        assert_eq!(params.padding, 0.0);
        assert!(params.shadow.enabled);
        assert_eq!(params.shadow.offset, (-2.0, 4.0));
        assert_eq!(params.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(params.background, BackgroundType::Solid);
        assert_eq!(params.solid_color, SolidId::Mint);
        assert_eq!(params.crop_rect, NormalizedRect::new(0.1, 0.1, 0.5, 0.5));
    }

    #[test]
    fn no_flags_keep_config_values() {
        let base = EditingParameters {
            padding: 7.0,
            gradient: GradientId::Forest,
            ..EditingParameters::default()
        };
        assert_eq!(EditArgs::default().apply(base.clone()), base);
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["shotframe", "palette", "-vv", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }
}
