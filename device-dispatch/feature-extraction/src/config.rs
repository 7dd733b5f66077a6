// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{ExtractionError, FeatureType, Framework, ModelFile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What happens with the features of each video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnExtraction {
    #[default]
    Print,
    SaveJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct I3dOptions {
    pub pwc_path: PathBuf,
    pub rgb_path: PathBuf,
    pub flow_path: PathBuf,
    /// min(height, width) frames are resized to
    pub min_side_size: u32,
    /// Keep the original frame rate when unset
    pub extraction_fps: Option<u32>,
    /// Frames per feature
    pub stack_size: u32,
    /// Frames between consecutive stacks
    pub step_size: u32,
    pub show_kinetics_pred: bool,
    pub kinetics_class_labels: PathBuf,
}

impl Default for I3dOptions {
    fn default() -> Self {
        Self {
            pwc_path: PathBuf::from("./models/i3d/checkpoints/pwc_net.pt"),
            rgb_path: PathBuf::from("./models/i3d/checkpoints/i3d_rgb.pt"),
            flow_path: PathBuf::from("./models/i3d/checkpoints/i3d_flow.pt"),
            min_side_size: 256,
            extraction_fps: None,
            stack_size: 64,
            step_size: 64,
            show_kinetics_pred: false,
            kinetics_class_labels: PathBuf::from("./checkpoints/label_map.txt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VggishOptions {
    /// May hold a `{}` placeholder, see [`ModelFile::interpolate`]
    pub model_path: String,
    pub pca_path: String,
}

impl Default for VggishOptions {
    fn default() -> Self {
        Self {
            model_path: "./models/{}/checkpoints/vggish_model.".to_string(),
            pca_path: "./models/{}/checkpoints/vggish_postprocess.".to_string(),
        }
    }
}

/// Everything an extraction run needs apart from its inputs and devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub feature_type: FeatureType,
    #[serde(default)]
    pub framework: Framework,
    /// Per-device scratch space for extracted frames
    #[serde(default = "default_tmp_path")]
    pub tmp_path: PathBuf,
    #[serde(default)]
    pub keep_frames: bool,
    #[serde(default)]
    pub on_extraction: OnExtraction,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub i3d: I3dOptions,
    #[serde(default)]
    pub vggish: VggishOptions,
    /// Program and leading arguments of the extractor invoked per video
    pub extractor_command: Vec<String>,
}

fn default_tmp_path() -> PathBuf {
    PathBuf::from("./tmp")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./output")
}

impl ExtractionConfig {
    pub fn new(feature_type: FeatureType, extractor_command: Vec<String>) -> Self {
        Self {
            feature_type,
            framework: Framework::default(),
            tmp_path: default_tmp_path(),
            keep_frames: false,
            on_extraction: OnExtraction::default(),
            output_path: default_output_path(),
            i3d: I3dOptions::default(),
            vggish: VggishOptions::default(),
            extractor_command,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ExtractionError> {
        let contents = fs::read_to_string(path).map_err(|e| ExtractionError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|source| ExtractionError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves `{}` placeholders in the vggish paths for the selected framework
    pub fn resolve_model_paths(&mut self) {
        self.vggish.model_path =
            ModelFile::Checkpoint.interpolate(&self.vggish.model_path, self.framework);
        self.vggish.pca_path =
            ModelFile::PcaParams.interpolate(&self.vggish.pca_path, self.framework);
    }

    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.extractor_command.is_empty() || self.extractor_command[0].trim().is_empty() {
            return Err(ExtractionError::InvalidConfig(
                "extractor command must name a program".to_string(),
            ));
        }
        if self.feature_type == FeatureType::I3d {
            let i3d = &self.i3d;
            if i3d.stack_size == 0 || i3d.step_size == 0 {
                return Err(ExtractionError::InvalidConfig(
                    "stack size and step size must be positive".to_string(),
                ));
            }
            if i3d.min_side_size == 0 {
                return Err(ExtractionError::InvalidConfig(
                    "min side size must be positive".to_string(),
                ));
            }
            if i3d.extraction_fps == Some(0) {
                return Err(ExtractionError::InvalidConfig(
                    "extraction fps must be positive when set".to_string(),
                ));
            }
        }
        Ok(())
    }
}
