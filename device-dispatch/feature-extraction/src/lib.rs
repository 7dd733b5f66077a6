// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod extraction_error;
pub use extraction_error::ExtractionError;

pub mod feature_type;
pub use feature_type::{FeatureType, Framework, ModelFile};

pub mod config;
pub use config::{ExtractionConfig, I3dOptions, OnExtraction, VggishOptions};

mod video_list;
pub use video_list::collect_video_paths;

mod features;
pub use features::Features;

pub mod extractor;
pub use extractor::{CommandExtractor, CommandExtractorFactory, ExtractorFactory, FeatureExtractor};

mod feature_sink;
pub use feature_sink::FeatureSink;

mod extraction_worker;
pub use extraction_worker::{ExtractionPrototype, ExtractionReplica};
