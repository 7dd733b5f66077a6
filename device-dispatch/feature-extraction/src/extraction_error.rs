// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid extraction config: {0}")]
    InvalidConfig(String),

    #[error("no video paths were given")]
    NoVideos,

    #[error("failed to start extractor '{program}': {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extractor '{program}' exited with {status} on '{}': {stderr}", .video.display())]
    CommandFailed {
        program: String,
        video: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("extractor output for '{}' is not a feature map: {source}", .video.display())]
    MalformedOutput {
        video: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write features to '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} video(s) failed on {placement}", .videos.len())]
    VideosFailed {
        placement: String,
        videos: Vec<PathBuf>,
    },
}

impl ExtractionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractionError::Io {
            path: path.into(),
            source,
        }
    }
}
