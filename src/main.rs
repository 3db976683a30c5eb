//! flatbed - photo-to-document converter
//!
//! CLI entry point

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use flatbed::{
    exit_codes, Cli, CliOverrides, Commands, Config, ExtractArgs, InputError, MergeArgs,
    MergeProgress, Pipeline, PipelineError, RembgBackend, ScanArgs, ScanMode,
};

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let config = load_config(&cli);
    let quiet = cli.quiet;

    let result = match cli.command {
        Commands::Extract(args) => run_extract(&args, config),
        Commands::Scan(args) => run_scan(&args, config),
        Commands::Merge(args) => run_merge(&args, config, quiet),
        Commands::Info => run_info(&config),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                PipelineError::Input(InputError::NotFound(_)) => exit_codes::INPUT_NOT_FOUND,
                _ => exit_codes::GENERAL_ERROR,
            }
        }
    });
}

// ============ Setup ============

/// Map verbosity flags to a tracing filter; RUST_LOG always wins.
fn init_logging(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "warn,flatbed=info",
            _ => "warn,flatbed=debug",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file (explicit path, then default locations), then
/// apply command-line overrides on top.
fn load_config(cli: &Cli) -> Config {
    let file_config = match &cli.config {
        Some(path) => match Config::load_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_default(),
    };

    let overrides = CliOverrides { dpi: cli.dpi };
    file_config.merge_with_cli(&overrides)
}

// ============ Commands ============

fn run_extract(args: &ExtractArgs, config: Config) -> Result<(), PipelineError> {
    let pipeline = Pipeline::new(config);
    let written = pipeline.extract(&args.input, &args.output)?;
    println!("Extracted object: {}", written.display());
    Ok(())
}

fn run_scan(args: &ScanArgs, config: Config) -> Result<(), PipelineError> {
    let mode = if args.color {
        ScanMode::Color
    } else {
        ScanMode::Monochrome
    };

    let pipeline = Pipeline::new(config);
    let written = pipeline.scan(&args.input, &args.output, mode)?;
    println!("Scanned to PDF: {}", written.display());
    Ok(())
}

fn run_merge(args: &MergeArgs, config: Config, quiet: bool) -> Result<(), PipelineError> {
    let enhance = args.scan.then_some(ScanMode::Monochrome);
    let pipeline = Pipeline::new(config);

    let progress = BarProgress::new(args.inputs.len(), quiet);
    let (written, report) = pipeline.merge(&args.inputs, &args.output, enhance, &progress)?;
    progress.finish();

    if !quiet {
        for skip in &report.skipped {
            eprintln!("Skipped {}: {}", skip.input, skip.reason);
        }
    }
    println!(
        "Merged {} page(s) to PDF: {}",
        report.pages_written,
        written.display()
    );
    Ok(())
}

fn run_info(config: &Config) -> Result<(), PipelineError> {
    println!("flatbed {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Page: {:.1}x{:.1} mm at {} dpi", config.page.width_mm, config.page.height_mm, config.page.dpi);
    let (px_w, px_h) = config.page.px_dimensions();
    println!("Page canvas: {}x{} px", px_w, px_h);
    println!("CPU cores: {}", num_cpus::get());
    println!();

    println!("Config search paths:");
    for path in Config::search_paths() {
        let marker = if path.exists() { " (found)" } else { "" };
        println!("  {}{}", path.display(), marker);
    }
    println!();

    match RembgBackend::new() {
        Ok(backend) => println!("Segmentation: rembg at {}", backend.command().display()),
        Err(_) => println!("Segmentation: rembg not found (extract keeps the original image)"),
    }

    Ok(())
}

// ============ Progress Bar ============

/// Merge progress rendered as an indicatif bar on stderr
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: usize, quiet: bool) -> Self {
        let bar = if quiet || total < 2 {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        let style = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl MergeProgress for BarProgress {
    fn on_item_start(&self, _index: usize, _total: usize, input: &str) {
        self.bar.set_message(input.to_string());
    }

    fn on_item_done(&self, _index: usize, _total: usize, _input: &str) {
        self.bar.inc(1);
    }

    fn on_item_skipped(&self, _index: usize, _input: &str, _reason: &str) {
        self.bar.inc(1);
    }
}
