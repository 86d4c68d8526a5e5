use anyhow::Result;
use clap::Parser;
use exif_viewer::audio;
use exif_viewer::media_type::{format_file_size, group_by_extension};
use exif_viewer::{export, remove_exif, suggested_filename, AppConfig, BulkProcessor, ExportFormat};
use log::{error, info, warn};
use std::path::PathBuf;

/// Extract metadata from media files and optionally export it.
#[derive(Parser, Debug)]
#[command(name = "exif-viewer", version)]
struct Cli {
    /// Files or directories to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Only scan the top level of directory inputs
    #[arg(long)]
    no_recursive: bool,

    /// Worker pool width (overrides config)
    #[arg(long)]
    workers: Option<usize>,

    /// Keep only records with decimal GPS coordinates
    #[arg(long)]
    geotagged: bool,

    /// Export format: json, csv or txt
    #[arg(long)]
    export: Option<ExportFormat>,

    /// Directory the export file is written to
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Remove EXIF data from the processed files in place (cannot be undone)
    #[arg(long)]
    strip: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::new()?;

    // Initialize env_logger based on config.log_level
    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting exif-viewer");
    if !audio::is_available() {
        warn!("{}", audio::CAPABILITY_MISSING);
    }

    if let Some(workers) = cli.workers {
        config.num_workers = workers;
    }
    let recursive = config.recursive && !cli.no_recursive;
    let processor = BulkProcessor::from_config(&config)?;

    let mut files = Vec::new();
    for input in &cli.inputs {
        if input.is_dir() {
            files.extend(processor.scan_directory(input, recursive));
        } else {
            files.push(input.clone());
        }
    }
    for (extension, paths) in group_by_extension(&files) {
        let bytes: u64 = paths
            .iter()
            .filter_map(|p| p.metadata().ok())
            .map(|m| m.len())
            .sum();
        info!("{}: {} files, {}", extension, paths.len(), format_file_size(bytes));
    }

    let mut results = processor.process_files_with_progress(&files, |completed, total| {
        info!("Processed {}/{} files", completed, total);
    });
    if cli.geotagged {
        results = results.filter_geotagged();
    }

    for (path, record) in &results {
        match record.error() {
            Some(error) => println!("{}: {}", path.display(), error),
            None => println!("{}: ok", path.display()),
        }
    }
    println!("{}", results.summary());

    if let Some(format) = cli.export {
        let output = cli.output.join(suggested_filename(&config.export_prefix, format));
        export(&results, format, &output)?;
        println!("Exported to {}", output.display());
    }

    if cli.strip {
        let mut stripped = 0;
        let mut failed = 0;
        for (path, _) in &results {
            match remove_exif(path, None) {
                Ok(true) => stripped += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("Failed to remove EXIF data from {:?}: {}", path, e);
                    failed += 1;
                }
            }
        }
        println!("EXIF data removed from {} files.", stripped);
        if failed > 0 {
            println!("{} files could not be processed.", failed);
        }
    }

    info!("exif-viewer finished");
    Ok(())
}
