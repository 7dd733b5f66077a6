// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::ExtractionError;
use std::fs;
use std::path::{Path, PathBuf};

/// Builds the list of videos to process.
///
/// A list file, one path per line, takes precedence over explicit paths.
/// Blank lines and surrounding whitespace are ignored.
pub fn collect_video_paths(
    video_paths: &[PathBuf],
    file_with_video_paths: Option<&Path>,
) -> Result<Vec<PathBuf>, ExtractionError> {
    let videos: Vec<PathBuf> = match file_with_video_paths {
        Some(list_file) => fs::read_to_string(list_file)
            .map_err(|e| ExtractionError::io(list_file, e))?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
        None => video_paths.to_vec(),
    };

    if videos.is_empty() {
        return Err(ExtractionError::NoVideos);
    }
    Ok(videos)
}
