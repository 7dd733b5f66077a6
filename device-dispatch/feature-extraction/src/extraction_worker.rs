// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::extractor::scratch_dir_for;
use crate::{ExtractionConfig, ExtractionError, ExtractorFactory, FeatureExtractor, FeatureSink};
use device_dispatch_core::{
    Partition, Placement, ProgressCounter, Replica, ReplicaError, RunOutcome, WorkSet,
    WorkerPrototype,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Worker prototype of an extraction run
///
/// Holds the video list, the extractor factory, the sink and the shared
/// progress counter; each placement gets its own [`ExtractionReplica`].
pub struct ExtractionPrototype {
    videos: WorkSet<PathBuf>,
    factory: Arc<dyn ExtractorFactory>,
    sink: FeatureSink,
    progress: ProgressCounter,
    tmp_path: PathBuf,
    keep_frames: bool,
}

impl ExtractionPrototype {
    pub fn new(
        config: &ExtractionConfig,
        videos: WorkSet<PathBuf>,
        factory: Arc<dyn ExtractorFactory>,
        progress: ProgressCounter,
    ) -> Self {
        Self {
            videos,
            factory,
            sink: FeatureSink::from_config(config),
            progress,
            tmp_path: config.tmp_path.clone(),
            keep_frames: config.keep_frames,
        }
    }

    pub fn videos(&self) -> &WorkSet<PathBuf> {
        &self.videos
    }

    pub fn progress(&self) -> &ProgressCounter {
        &self.progress
    }
}

impl WorkerPrototype for ExtractionPrototype {
    type Replica = ExtractionReplica;

    fn place_on(&self, placement: &Placement) -> Result<ExtractionReplica, ReplicaError> {
        let extractor = self.factory.create(placement)?;
        debug!(placement = %placement, "extractor placed");
        Ok(ExtractionReplica {
            placement: placement.clone(),
            extractor,
            videos: self.videos.clone(),
            sink: self.sink.clone(),
            progress: self.progress.clone(),
            scratch_dir: scratch_dir_for(&self.tmp_path, placement),
            keep_frames: self.keep_frames,
        })
    }
}

/// Extractor bound to one placement, working through its partition of videos
pub struct ExtractionReplica {
    placement: Placement,
    extractor: Box<dyn FeatureExtractor>,
    videos: WorkSet<PathBuf>,
    sink: FeatureSink,
    progress: ProgressCounter,
    scratch_dir: PathBuf,
    keep_frames: bool,
}

impl ExtractionReplica {
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Frame directory of one video: `<scratch>/<index>-<stem>`, unique per
    /// work-set position even when file names repeat
    pub fn video_scratch_dir(&self, index: usize, video: &Path) -> PathBuf {
        let stem = video
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        self.scratch_dir.join(format!("{}-{}", index, stem))
    }

    fn process(&mut self, index: usize, video: &Path) -> Result<(), ExtractionError> {
        let frames_dir = self.video_scratch_dir(index, video);
        fs::create_dir_all(&frames_dir).map_err(|e| ExtractionError::io(&frames_dir, e))?;

        let result = self
            .extractor
            .extract(video, &frames_dir)
            .and_then(|features| self.sink.emit(video, &features));

        if !self.keep_frames {
            self.clean(&frames_dir, fs::remove_dir_all(&frames_dir));
        }
        result
    }

    fn clean(&self, dir: &Path, outcome: std::io::Result<()>) {
        match outcome {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                placement = %self.placement,
                "failed to clean {}: {}",
                dir.display(),
                e
            ),
        }
    }
}

impl Replica for ExtractionReplica {
    /// Failed videos are logged and skipped; the replica reports them
    /// together once the whole partition has been attempted.
    fn run(&mut self, partition: Partition) -> RunOutcome {
        info!(
            placement = %self.placement,
            partition = %partition,
            "extracting {} videos",
            partition.len()
        );

        let videos = self.videos.clone();
        let mut failed = Vec::new();
        for (index, video) in partition.indices().zip(videos.slice(partition)) {
            if let Err(e) = self.process(index, video) {
                warn!(
                    placement = %self.placement,
                    video = %video.display(),
                    "extraction failed: {}",
                    e
                );
                failed.push(video.clone());
            }
            self.progress.advance(1);
        }

        if !self.keep_frames {
            self.clean(&self.scratch_dir, fs::remove_dir(&self.scratch_dir));
        }

        if failed.is_empty() {
            return Ok(());
        }
        Err(Box::new(ExtractionError::VideosFailed {
            placement: self.placement.to_string(),
            videos: failed,
        }))
    }
}
