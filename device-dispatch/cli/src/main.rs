// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod args;

use args::{Cli, RuntimeKind};
use clap::Parser;
use device_dispatch_core::{partition, Dispatcher, ProgressCounter, ProgressSnapshot, WorkSet};
use device_dispatch_feature_extraction::{
    collect_video_paths, CommandExtractorFactory, ExtractionPrototype, Framework, OnExtraction,
};
use device_dispatch_task_runtime::TokioRuntime;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("extraction failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let mut config = cli.extraction_config()?;
    config.resolve_model_paths();
    config.validate()?;

    info!("=== FEATURE EXTRACTION ===");
    info!("  - Feature type: {}", config.feature_type);
    if config.framework == Framework::Pytorch {
        info!("Using pytorch implementation!");
    }
    if config.on_extraction == OnExtraction::SaveJson {
        info!("Saving features to {}", config.output_path.display());
    }
    if config.keep_frames {
        info!("Keeping temp files in {}", config.tmp_path.display());
    }

    let videos: WorkSet<PathBuf> =
        collect_video_paths(&cli.video_paths, cli.file_with_video_paths.as_deref())?.into();
    let devices = cli.device_list()?;
    if devices.is_empty() {
        info!("Running without accelerator support!");
    }
    info!("  - Videos: {}", videos.len());
    info!("  - Devices: {}", devices.len());

    let config = Arc::new(config);
    let factory = Arc::new(CommandExtractorFactory::new(Arc::clone(&config))?);
    let progress = ProgressCounter::with_renderer(videos.len(), render_progress);
    let prototype = ExtractionPrototype::new(&config, videos.clone(), factory, progress.clone());

    let assignments = partition(videos.len(), &devices);
    info!("  - Units: {}", assignments.len());

    let result = match cli.runtime.for_units(assignments.len()) {
        RuntimeKind::Threads => Dispatcher::on_threads().dispatch(&prototype, &assignments),
        RuntimeKind::Tokio => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            Dispatcher::new(TokioRuntime::new(runtime.handle().clone()))
                .dispatch(&prototype, &assignments)
        }
    };

    // Every replica has stopped by now
    progress.close();
    eprintln!();
    result?;

    info!("=== EXTRACTION COMPLETE ===");
    info!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn render_progress(snapshot: ProgressSnapshot) {
    eprint!("\rextracted {}/{} videos", snapshot.completed, snapshot.total);
}
