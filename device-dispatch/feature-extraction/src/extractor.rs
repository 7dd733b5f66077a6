// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The extraction backend seen by replicas.
//!
//! Model inference lives outside this workspace: [`CommandExtractor`] runs an
//! external program once per video on the replica's device and reads the
//! feature map it prints as JSON.

use crate::{ExtractionConfig, ExtractionError, FeatureType, Features};
use device_dispatch_core::Placement;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// Trait for extractors bound to one device
pub trait FeatureExtractor: Send {
    /// Extract every feature stream of `video`, using `scratch_dir` for frames
    fn extract(&mut self, video: &Path, scratch_dir: &Path) -> Result<Features, ExtractionError>;
}

/// Trait for creating an extractor per placement
pub trait ExtractorFactory: Send + Sync {
    fn create(&self, placement: &Placement) -> Result<Box<dyn FeatureExtractor>, ExtractionError>;
}

impl<F> ExtractorFactory for F
where
    F: Fn(&Placement) -> Result<Box<dyn FeatureExtractor>, ExtractionError> + Send + Sync,
{
    fn create(&self, placement: &Placement) -> Result<Box<dyn FeatureExtractor>, ExtractionError> {
        (self)(placement)
    }
}

/// Runs the configured extractor command for each video
pub struct CommandExtractor {
    config: Arc<ExtractionConfig>,
    placement: Placement,
}

impl CommandExtractor {
    pub fn new(config: Arc<ExtractionConfig>, placement: Placement) -> Self {
        Self { config, placement }
    }

    /// Full argument list handed to the program for one video
    pub fn arguments(&self, video: &Path, scratch_dir: &Path) -> Vec<String> {
        let config = &self.config;
        let mut args: Vec<String> = config.extractor_command.iter().skip(1).cloned().collect();
        args.extend([
            "--video".to_string(),
            video.display().to_string(),
            "--device".to_string(),
            self.placement.to_string(),
            "--feature-type".to_string(),
            config.feature_type.to_string(),
            "--tmp-path".to_string(),
            scratch_dir.display().to_string(),
        ]);

        match config.feature_type {
            FeatureType::I3d => {
                let i3d = &config.i3d;
                args.extend([
                    "--pwc-path".to_string(),
                    i3d.pwc_path.display().to_string(),
                    "--i3d-rgb-path".to_string(),
                    i3d.rgb_path.display().to_string(),
                    "--i3d-flow-path".to_string(),
                    i3d.flow_path.display().to_string(),
                    "--min-side-size".to_string(),
                    i3d.min_side_size.to_string(),
                    "--stack-size".to_string(),
                    i3d.stack_size.to_string(),
                    "--step-size".to_string(),
                    i3d.step_size.to_string(),
                ]);
                if let Some(fps) = i3d.extraction_fps {
                    args.extend(["--extraction-fps".to_string(), fps.to_string()]);
                }
                if i3d.show_kinetics_pred {
                    args.extend([
                        "--show-kinetics-pred".to_string(),
                        "--kinetics-class-labels".to_string(),
                        i3d.kinetics_class_labels.display().to_string(),
                    ]);
                }
            }
            FeatureType::Vggish => {
                args.extend([
                    "--framework".to_string(),
                    config.framework.to_string(),
                    "--vggish-model-path".to_string(),
                    config.vggish.model_path.clone(),
                    "--vggish-pca-path".to_string(),
                    config.vggish.pca_path.clone(),
                ]);
            }
        }
        args
    }
}

impl FeatureExtractor for CommandExtractor {
    fn extract(&mut self, video: &Path, scratch_dir: &Path) -> Result<Features, ExtractionError> {
        let program = self.config.extractor_command.first().ok_or_else(|| {
            ExtractionError::InvalidConfig("extractor command must name a program".to_string())
        })?;
        debug!(placement = %self.placement, video = %video.display(), "running extractor");

        let output = Command::new(program)
            .args(self.arguments(video, scratch_dir))
            .output()
            .map_err(|source| ExtractionError::CommandSpawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractionError::CommandFailed {
                program: program.clone(),
                video: video.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|source| ExtractionError::MalformedOutput {
            video: video.to_path_buf(),
            source,
        })
    }
}

/// Creates a [`CommandExtractor`] per placement
#[derive(Debug, Clone)]
pub struct CommandExtractorFactory {
    config: Arc<ExtractionConfig>,
}

impl CommandExtractorFactory {
    /// # Errors
    /// Fails when the config does not validate.
    pub fn new(config: Arc<ExtractionConfig>) -> Result<Self, ExtractionError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl ExtractorFactory for CommandExtractorFactory {
    fn create(&self, placement: &Placement) -> Result<Box<dyn FeatureExtractor>, ExtractionError> {
        Ok(Box::new(CommandExtractor::new(
            Arc::clone(&self.config),
            placement.clone(),
        )))
    }
}

/// Scratch directory of one placement below `tmp_path`.
///
/// Bytes other than ASCII alphanumerics and `-` are written as `_xx` hex
/// escapes, so distinct placements never share a directory
/// (`cuda:0` -> `cuda_3a0`, `cuda_0` -> `cuda_5f0`).
pub fn scratch_dir_for(tmp_path: &Path, placement: &Placement) -> PathBuf {
    let mut name = String::new();
    for byte in placement.to_string().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("_{:02x}", byte));
        }
    }
    tmp_path.join(name)
}
