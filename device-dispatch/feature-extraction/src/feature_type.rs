// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Feature families and the framework backing each of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    /// Two-stream (RGB + optical flow) video features
    I3d,
    /// Audio features
    Vggish,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::I3d => "i3d",
            FeatureType::Vggish => "vggish",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i3d" => Ok(FeatureType::I3d),
            "vggish" => Ok(FeatureType::Vggish),
            other => Err(format!("unknown feature type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Tensorflow,
    Pytorch,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Tensorflow => "tensorflow",
            Framework::Pytorch => "pytorch",
        }
    }

    /// Directory holding this framework's vggish implementation
    fn vggish_dir(&self) -> &'static str {
        match self {
            Framework::Tensorflow => "vggish",
            Framework::Pytorch => "vggish_torch",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files a vggish extractor loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFile {
    Checkpoint,
    PcaParams,
}

impl ModelFile {
    fn extension(&self, framework: Framework) -> &'static str {
        match (self, framework) {
            (_, Framework::Pytorch) => "pt",
            (ModelFile::Checkpoint, Framework::Tensorflow) => "ckpt",
            (ModelFile::PcaParams, Framework::Tensorflow) => "npz",
        }
    }

    /// Fills a `{}` template with the framework's directory and appends the
    /// framework's extension. Paths without a placeholder are kept as given.
    ///
    /// `./models/{}/checkpoints/vggish_model.` becomes
    /// `./models/vggish_torch/checkpoints/vggish_model.pt` for pytorch.
    pub fn interpolate(&self, template: &str, framework: Framework) -> String {
        if !template.contains("{}") {
            return template.to_string();
        }
        let mut path = template.replace("{}", framework.vggish_dir());
        path.push_str(self.extension(framework));
        path
    }
}
