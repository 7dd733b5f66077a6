// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{ExtractionConfig, ExtractionError, FeatureType, Features, OnExtraction};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination of extracted features, shared by every replica
#[derive(Debug, Clone)]
pub struct FeatureSink {
    mode: OnExtraction,
    output_path: PathBuf,
    feature_type: FeatureType,
}

impl FeatureSink {
    pub fn new(mode: OnExtraction, output_path: PathBuf, feature_type: FeatureType) -> Self {
        Self {
            mode,
            output_path,
            feature_type,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.on_extraction,
            config.output_path.clone(),
            config.feature_type,
        )
    }

    /// File the features of `video` are saved to
    pub fn output_file(&self, video: &Path) -> PathBuf {
        let stem = video
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        self.output_path
            .join(format!("{}_{}.json", stem, self.feature_type))
    }

    pub fn emit(&self, video: &Path, features: &Features) -> Result<(), ExtractionError> {
        match self.mode {
            OnExtraction::Print => {
                // One locked write per video keeps concurrent replicas from interleaving
                let mut stdout = io::stdout().lock();
                write!(stdout, "{}\n{}", video.display(), features)
                    .and_then(|_| stdout.flush())
                    .map_err(|e| ExtractionError::io("<stdout>", e))
            }
            OnExtraction::SaveJson => {
                fs::create_dir_all(&self.output_path)
                    .map_err(|e| ExtractionError::io(&self.output_path, e))?;
                let path = self.output_file(video);
                let file = File::create(&path).map_err(|e| ExtractionError::io(&path, e))?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, features).map_err(|source| {
                    ExtractionError::Write {
                        path: path.clone(),
                        source,
                    }
                })?;
                writer.flush().map_err(|e| ExtractionError::io(&path, e))
            }
        }
    }
}
