use clap::{Parser, Subcommand};
use sizewise::cancel::RequestSlot;
use sizewise::config::{self, SizewiseConfig};
use sizewise::form::OptionForm;
use sizewise::imaging::builtin::save_raster;
use sizewise::imaging::params::{FitMethod, ResizeConfiguration, ResizeMethod, SizingMode};
use sizewise::loading::LoadingIndicator;
use sizewise::output;
use sizewise::pipeline::{self, Backends, ResizeEvent};
use sizewise::source::SourceImage;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "sizewise")]
#[command(about = "Resize images with a choice of algorithms and automatic fallback")]
#[command(long_about = "\
Resize images with a choice of algorithms and automatic fallback

Inputs can be PNG, JPEG, TIFF or WebP rasters, or SVG drawings. Output format
follows the output file extension.

Methods:
  vector                  re-render an SVG at the target size
  lanczos3, mitchell,     convolution on a worker thread pool; frames the
  catrom, triangle, hqx   worker cannot hold fall back to builtin-high
  builtin-pixelated, builtin-low, builtin-medium, builtin-high
                          in-process resampler

Sizing:
  --width/--height        explicit target (default: source size)
  --longest-edge N        scale so the longer side is N (1-9999, always stretch)
  --fit contain           crop to the target aspect before scaling

Run 'sizewise gen-config' to generate a documented sizewise.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; stock defaults apply when missing)
    #[arg(long, default_value = "sizewise.toml", global = true)]
    config: PathBuf,

    /// Log resolution and dispatch details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ResizeArgs {
    /// Source image
    input: PathBuf,
    /// Destination; format follows the extension
    output: PathBuf,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Target for the longer side; implies --size-mode longest-edge
    #[arg(long)]
    longest_edge: Option<u32>,
    #[arg(long)]
    size_mode: Option<SizingMode>,
    #[arg(long)]
    method: Option<ResizeMethod>,
    #[arg(long)]
    fit: Option<FitMethod>,
    /// Disable alpha-aware convolution (worker methods)
    #[arg(long)]
    no_premultiply: bool,
    /// Convolve in sRGB instead of linear light (worker methods)
    #[arg(long)]
    no_linear_rgb: bool,
    /// Derive the missing edge from the source aspect ratio
    #[arg(long)]
    keep_aspect: bool,
    /// Print progress events as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Resize one image
    Resize(ResizeArgs),
    /// Show the preset sizes for an image
    Presets {
        input: PathBuf,
    },
    /// Print a stock sizewise.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Resize(args) => {
            let site = config::load_config(&cli.config)?;
            run_resize(&site, &args)?;
        }
        Command::Presets { input } => {
            let source = SourceImage::open(&input)?;
            let (w, h) = source.dimensions().as_tuple();
            let initial = ResizeConfiguration {
                width: w,
                height: h,
                ..ResizeConfiguration::default()
            };
            let form = OptionForm::new((w, h), source.is_vector(), initial);
            output::print_presets(&input, &source, form.presets(), form.preset());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sizewise=debug" } else { "sizewise=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run_resize(site: &SizewiseConfig, args: &ResizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = SourceImage::open(&args.input)?;
    if !args.json {
        println!("{}", output::format_source(&args.input, &source));
    }

    let config = configure(site, args, &source)?;
    let backends = Backends::from_config(site)?;

    let slot = RequestSlot::new();
    let token = slot.begin();
    let (tx, rx) = mpsc::channel();
    let delay = site.preview.loading_delay();
    let json = args.json;
    let printer = std::thread::spawn(move || print_events(rx, delay, json));

    let result = pipeline::resize(&token, &source, &config, &backends, Some(&tx));
    drop(tx);
    printer.join().map_err(|_| "event printer panicked")?;

    let image = result?;
    save_raster(&image, &args.output)?;
    if !args.json {
        println!("Wrote {}", args.output.display());
    }
    Ok(())
}

/// Build the request through the option form so CLI input gets the same
/// validation and aspect handling as interactive edits.
fn configure(
    site: &SizewiseConfig,
    args: &ResizeArgs,
    source: &SourceImage,
) -> Result<ResizeConfiguration, Box<dyn std::error::Error>> {
    let intrinsic = source.dimensions().as_tuple();
    let mut initial = site.resize.to_configuration(intrinsic.0, intrinsic.1);
    if let Some(method) = args.method {
        initial.method = method;
    }
    if let Some(fit) = args.fit {
        initial.fit_method = fit;
    }
    if args.longest_edge.is_some() {
        initial.size_mode = SizingMode::LongestEdge;
    }
    if let Some(mode) = args.size_mode {
        initial.size_mode = mode;
    }
    if args.no_premultiply {
        initial.premultiply_alpha = false;
    }
    if args.no_linear_rgb {
        initial.linear_rgb = false;
    }

    let mut form = OptionForm::new(intrinsic, source.is_vector(), initial);
    form.set_maintain_aspect(args.keep_aspect)?;
    if let Some(edge) = args.longest_edge {
        form.set_longest_edge(&edge.to_string())?;
    }
    match (args.width, args.height) {
        (Some(w), _) if args.keep_aspect => {
            form.set_width(&w.to_string())?;
        }
        (None, Some(h)) if args.keep_aspect => {
            form.set_height(&h.to_string())?;
        }
        (w, h) => {
            if let Some(w) = w {
                form.set_width(&w.to_string())?;
            }
            if let Some(h) = h {
                form.set_height(&h.to_string())?;
            }
        }
    }
    Ok(form.configuration())
}

/// Print pipeline events, showing a busy line if the request outlasts `delay`.
fn print_events(rx: Receiver<ResizeEvent>, delay: Duration, json: bool) {
    let mut indicator = LoadingIndicator::new(delay);
    indicator.start(Instant::now());
    loop {
        let wait = indicator
            .deadline()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_secs(3600));
        match rx.recv_timeout(wait) {
            Ok(event) if json => match output::format_resize_event_json(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(%e, "failed to serialize event"),
            },
            Ok(event) => output::print_resize_event(&event),
            Err(RecvTimeoutError::Timeout) => {
                if indicator.tick(Instant::now()) && !json {
                    println!("    Working...");
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    indicator.finish();
}
