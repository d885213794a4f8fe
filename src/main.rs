//! Dashboard Screenshot
//!
//! Command-line driver: reads a dashboard screenshot and prints the widgets
//! found in it as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dashboard_screenshot::config::{get_config, init_config, load_config};
use dashboard_screenshot::export::{export_to_json, to_json_string};
use dashboard_screenshot::ocr::{ensure_tessdata, TesseractEngine};
use dashboard_screenshot::annotate::annotate_regions;
use dashboard_screenshot::{paths, WidgetPipeline};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract widgets from a screenshot
    Scan {
        /// PNG or JPEG screenshot
        image: PathBuf,

        /// Category for widgets that match no keyword
        #[arg(short, long, default_value = "System")]
        category: String,

        /// Config file (defaults to config.json next to the executable)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a copy of the screenshot with detected regions outlined
        #[arg(long)]
        annotate: Option<PathBuf>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat the whole screenshot as a single widget
        #[arg(long)]
        whole: bool,
    },
    /// Download trained data for the recognition engine if none is installed
    Setup {
        #[arg(long, default_value = "eng")]
        language: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = std::str::FromStr::from_str(&cli.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    match cli.command {
        Command::Scan {
            image,
            category,
            config,
            annotate,
            output,
            whole,
        } => scan(image, &category, config, annotate, output, whole),
        Command::Setup { language } => {
            let dir = ensure_tessdata(&language)?;
            println!("tessdata for '{}' ready in {}", language, dir.display());
            Ok(())
        }
    }
}

fn scan(
    image_path: PathBuf,
    category: &str,
    config_path: Option<PathBuf>,
    annotate_path: Option<PathBuf>,
    output: Option<PathBuf>,
    whole: bool,
) -> Result<()> {
    init_config(load_config(
        &config_path.unwrap_or_else(paths::get_config_path),
    ));
    let config = get_config();

    let image = image::open(&image_path)
        .with_context(|| format!("Failed to open {}", image_path.display()))?;
    log::info!(
        "Loaded {} ({}x{})",
        image_path.display(),
        image.width(),
        image.height()
    );

    let engine = TesseractEngine::locate(&config.language)?;
    let pipeline = WidgetPipeline::new(engine, config.clone())?;
    log::debug!(
        "Layout modes {:?}, {} workers",
        pipeline.config().layout_modes,
        pipeline.config().workers
    );

    if let Some(path) = &annotate_path {
        let regions = pipeline.detect_regions(&image);
        annotate_regions(&image, &regions)
            .save(path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        log::info!("Annotated {} regions into {}", regions.len(), path.display());
    }

    let widgets = if whole {
        vec![pipeline.process_whole_image(&image, category)?]
    } else {
        pipeline.process_screenshot(&image, category)?
    };
    log::info!("Extracted {} widgets", widgets.len());

    match output {
        Some(path) => {
            export_to_json(&widgets, &path)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", to_json_string(&widgets)?),
    }

    Ok(())
}
