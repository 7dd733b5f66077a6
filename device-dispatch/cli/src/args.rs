// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use clap::{Parser, ValueEnum};
use device_dispatch_core::{DeviceList, DispatchError};
use device_dispatch_feature_extraction::{
    ExtractionConfig, ExtractionError, FeatureType, Framework, OnExtraction,
};
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnExtractionArg {
    Print,
    SaveJson,
}

impl From<OnExtractionArg> for OnExtraction {
    fn from(arg: OnExtractionArg) -> Self {
        match arg {
            OnExtractionArg::Print => OnExtraction::Print,
            OnExtractionArg::SaveJson => OnExtraction::SaveJson,
        }
    }
}

/// How replicas are executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RuntimeKind {
    /// One OS thread per device
    #[default]
    Threads,
    /// Tokio blocking pool
    Tokio,
}

impl RuntimeKind {
    /// Runtime actually needed for `units` assignments. A single unit runs
    /// inline, so no tokio pool is built for it.
    pub fn for_units(self, units: usize) -> RuntimeKind {
        if units <= 1 {
            RuntimeKind::Threads
        } else {
            self
        }
    }
}

/// Extract video features, one replica per device
#[derive(Debug, Parser)]
#[command(name = "extract-features", version)]
pub struct Cli {
    /// JSON extraction config; flags given on the command line override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, required_unless_present = "config")]
    pub feature_type: Option<FeatureType>,

    /// Space-separated paths to videos
    #[arg(long, num_args = 1..)]
    pub video_paths: Vec<PathBuf>,

    /// Text file with one video path per line
    #[arg(long)]
    pub file_with_video_paths: Option<PathBuf>,

    /// Space-separated device ids
    #[arg(long, num_args = 1..)]
    pub device_ids: Vec<String>,

    /// Run on the host without any accelerator
    #[arg(long, alias = "nocuda")]
    pub no_accelerator: bool,

    /// Folder to store the extracted frames before the extraction
    #[arg(long)]
    pub tmp_path: Option<PathBuf>,

    /// Keep frames after feature extraction
    #[arg(long)]
    pub keep_frames: bool,

    #[arg(long, value_enum)]
    pub on_extraction: Option<OnExtractionArg>,

    /// Where to store results if saved
    #[arg(long)]
    pub output_path: Option<PathBuf>,

    #[arg(long)]
    pub pwc_path: Option<PathBuf>,

    #[arg(long)]
    pub i3d_rgb_path: Option<PathBuf>,

    #[arg(long)]
    pub i3d_flow_path: Option<PathBuf>,

    /// min(HEIGHT, WIDTH)
    #[arg(long)]
    pub min_side_size: Option<u32>,

    /// Leave unset to keep the original video fps
    #[arg(long)]
    pub extraction_fps: Option<u32>,

    /// Feature time span in frames
    #[arg(long)]
    pub stack_size: Option<u32>,

    /// Feature step size in frames
    #[arg(long)]
    pub step_size: Option<u32>,

    /// Show the i3d predictions as kinetics classes for each feature
    #[arg(long)]
    pub show_kinetics_pred: bool,

    #[arg(long)]
    pub kinetics_class_labels: Option<PathBuf>,

    #[arg(long)]
    pub vggish_model_path: Option<String>,

    #[arg(long)]
    pub vggish_pca_path: Option<String>,

    /// Use the pytorch vggish implementation instead of tensorflow
    #[arg(long)]
    pub pytorch: bool,

    /// Extractor program and its leading arguments
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub extractor_command: Vec<String>,

    #[arg(long, value_enum, default_value_t = RuntimeKind::Threads)]
    pub runtime: RuntimeKind,

    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,
}

impl Cli {
    /// Config file (if any) with command-line flags applied on top
    pub fn extraction_config(&self) -> Result<ExtractionConfig, ExtractionError> {
        let mut config = match (&self.config, self.feature_type) {
            (Some(path), _) => ExtractionConfig::load(path)?,
            (None, Some(feature_type)) => {
                ExtractionConfig::new(feature_type, self.extractor_command.clone())
            }
            (None, None) => {
                return Err(ExtractionError::InvalidConfig(
                    "either --config or --feature-type is required".to_string(),
                ))
            }
        };

        if let Some(feature_type) = self.feature_type {
            config.feature_type = feature_type;
        }
        if !self.extractor_command.is_empty() {
            config.extractor_command = self.extractor_command.clone();
        }
        if self.pytorch {
            config.framework = Framework::Pytorch;
        }
        if let Some(tmp_path) = &self.tmp_path {
            config.tmp_path = tmp_path.clone();
        }
        config.keep_frames |= self.keep_frames;
        if let Some(on_extraction) = self.on_extraction {
            config.on_extraction = on_extraction.into();
        }
        if let Some(output_path) = &self.output_path {
            config.output_path = output_path.clone();
        }

        let i3d = &mut config.i3d;
        if let Some(path) = &self.pwc_path {
            i3d.pwc_path = path.clone();
        }
        if let Some(path) = &self.i3d_rgb_path {
            i3d.rgb_path = path.clone();
        }
        if let Some(path) = &self.i3d_flow_path {
            i3d.flow_path = path.clone();
        }
        if let Some(size) = self.min_side_size {
            i3d.min_side_size = size;
        }
        if self.extraction_fps.is_some() {
            i3d.extraction_fps = self.extraction_fps;
        }
        if let Some(size) = self.stack_size {
            i3d.stack_size = size;
        }
        if let Some(size) = self.step_size {
            i3d.step_size = size;
        }
        i3d.show_kinetics_pred |= self.show_kinetics_pred;
        if let Some(path) = &self.kinetics_class_labels {
            i3d.kinetics_class_labels = path.clone();
        }

        if let Some(path) = &self.vggish_model_path {
            config.vggish.model_path = path.clone();
        }
        if let Some(path) = &self.vggish_pca_path {
            config.vggish.pca_path = path.clone();
        }

        Ok(config)
    }

    /// Devices to dispatch on; empty when running on the host
    pub fn device_list(&self) -> Result<DeviceList, DispatchError> {
        if self.no_accelerator {
            return Ok(DeviceList::host_only());
        }
        DeviceList::parse(&self.device_ids)
    }
}
