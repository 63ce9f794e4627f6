use avfit::batch::{self, BatchEvent};
use avfit::config::{self, RequestOverrides};
use avfit::imaging::{ByteSize, CropBox, OutputFormat, RustBackend};
use avfit::{naming, output};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Request flags shared by `resize` and `batch`.
#[derive(clap::Args, Clone)]
struct TransformArgs {
    /// Preset id (see `avfit presets`)
    #[arg(long, short)]
    preset: Option<String>,

    /// Target width in pixels (overrides the preset's)
    #[arg(long, short = 'W')]
    width: Option<u32>,

    /// Target height in pixels (overrides the preset's)
    #[arg(long, short = 'H')]
    height: Option<u32>,

    /// Output format: original, jpeg, jpg, png, webp
    #[arg(long, short)]
    format: Option<OutputFormat>,

    /// Lossy encoding quality
    #[arg(long, short, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Unsharp mask strength (0 = off)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    sharpen: Option<u32>,

    /// Center-crop to the target aspect instead of letterboxing
    #[arg(long, overrides_with = "no_auto_crop")]
    auto_crop: bool,

    /// Letterbox even if avfit.toml sets auto_crop = true
    #[arg(long, overrides_with = "auto_crop")]
    no_auto_crop: bool,

    /// Crop box as fractions of the source: x,y,width,height (beats --auto-crop)
    #[arg(long, value_name = "X,Y,W,H")]
    crop_box: Option<CropBox>,

    /// JPEG size budget, e.g. 500KB or 2MB (0 = none)
    #[arg(long, value_name = "SIZE")]
    max_size: Option<ByteSize>,
}

impl TransformArgs {
    fn overrides(&self) -> RequestOverrides {
        RequestOverrides {
            preset: self.preset.clone(),
            width: self.width,
            height: self.height,
            format: self.format,
            quality: self.quality,
            sharpen: self.sharpen,
            auto_crop: match (self.auto_crop, self.no_auto_crop) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            crop_box: self.crop_box,
            max_size: self.max_size,
        }
    }
}

#[derive(Parser)]
#[command(name = "avfit")]
#[command(about = "Resize, crop and compress images for AV displays")]
#[command(long_about = "\
Resize, crop and compress images for AV displays

Fits images to device presets (HD and 4K displays, signage, touch panels,
slide decks) or to any WIDTHxHEIGHT. Without a crop the whole image is kept
and letterboxed on black; --auto-crop trims the longer side to the target
aspect; --crop-box keeps an exact region.

Examples:

  avfit resize lobby.jpg --preset 1080p --auto-crop
  avfit resize panel.png -W 1024 -H 600 --format png --sharpen 30
  avfit resize poster.jpg --preset signage-portrait --max-size 500KB
  avfit batch photos/ --preset powerpoint --out-dir slides/

Run 'avfit gen-config' to generate a documented avfit.toml.")]
#[command(version)]
struct Cli {
    /// Config file [default: ./avfit.toml if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform a single image
    Resize {
        /// Source image (JPEG, PNG or WebP)
        input: PathBuf,

        #[command(flatten)]
        args: TransformArgs,

        /// Directory for the output file [default: next to the input]
        #[arg(long, conflicts_with = "output")]
        out_dir: Option<PathBuf>,

        /// Exact output path; its extension picks the format unless --format is given
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Transform many images in parallel with the same settings
    Batch {
        /// Image files and/or directories (searched recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        args: TransformArgs,

        /// Directory for the output files
        #[arg(long)]
        out_dir: PathBuf,

        /// Print the batch report as JSON instead of progress lines
        #[arg(long)]
        json: bool,
    },
    /// List built-in and configured presets
    Presets,
    /// Print a stock avfit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Resize {
            input,
            args,
            out_dir,
            output: output_path,
        } => {
            let app_config = config::load_config(cli.config.as_deref())?;
            let presets = app_config.preset_repository();

            let mut overrides = args.overrides();
            if overrides.format.is_none() {
                overrides.format = output_path.as_deref().and_then(format_from_extension);
            }
            let resolved = config::resolve_request(&app_config, &presets, &overrides)?;

            let dir = out_dir.unwrap_or_else(|| parent_dir(&input));
            let source_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let written = batch::transform_file(
                &RustBackend::new(),
                &input,
                &resolved.request,
                |mime| match output_path {
                    Some(path) => path,
                    None => dir.join(naming::output_file_name(
                        &source_name,
                        &resolved.label,
                        mime,
                    )),
                },
            )?;
            output::print_resize_output(&input, &resolved.request, &written);
        }
        Command::Batch {
            inputs,
            args,
            out_dir,
            json,
        } => {
            let app_config = config::load_config(cli.config.as_deref())?;
            let presets = app_config.preset_repository();
            let resolved = config::resolve_request(&app_config, &presets, &args.overrides())?;
            init_thread_pool(&app_config.processing);

            let sources = batch::collect_sources(&inputs)?;
            if sources.is_empty() {
                return Err("no supported images found in the given inputs".into());
            }

            let report = if json {
                batch::run_batch(&sources, &resolved.request, &resolved.label, &out_dir, None)?
            } else {
                let (tx, rx) = std::sync::mpsc::channel::<BatchEvent>();
                let printer = std::thread::spawn(move || {
                    for event in rx {
                        for line in output::format_batch_event(&event) {
                            println!("{}", line);
                        }
                    }
                });
                let report = batch::run_batch(
                    &sources,
                    &resolved.request,
                    &resolved.label,
                    &out_dir,
                    Some(tx),
                )?;
                printer
                    .join()
                    .map_err(|_| "progress printer thread panicked")?;
                report
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_batch_summary(&report);
            }
            if report.failed() > 0 {
                return Err(format!(
                    "{} of {} images failed",
                    report.failed(),
                    report.items.len()
                )
                .into());
            }
        }
        Command::Presets => {
            let app_config = config::load_config(cli.config.as_deref())?;
            output::print_presets(app_config.preset_repository().all());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn format_from_extension(path: &Path) -> Option<OutputFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_name)
        .filter(|f| *f != OutputFormat::Original)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
