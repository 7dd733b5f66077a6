// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use device_dispatch_core::{
    dispatch_on_threads, DeviceList, DispatchError, Placement, ProgressCounter, WorkSet,
};
use device_dispatch_feature_extraction::extractor::scratch_dir_for;
use device_dispatch_feature_extraction::{
    CommandExtractor, ExtractionConfig, ExtractionError, ExtractionPrototype, ExtractorFactory,
    FeatureExtractor, FeatureSink, FeatureType, Features, OnExtraction,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "device-dispatch-worker-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

type Calls = Arc<Mutex<Vec<(String, PathBuf)>>>;

/// Returns one feature row per video; fails on videos named `broken*`
struct FakeExtractor {
    placement: Placement,
    calls: Calls,
}

impl FeatureExtractor for FakeExtractor {
    fn extract(&mut self, video: &Path, scratch_dir: &Path) -> Result<Features, ExtractionError> {
        assert!(scratch_dir.is_dir(), "scratch dir must exist while extracting");
        fs::write(scratch_dir.join("frame_0001.jpg"), b"frame").unwrap();
        self.calls
            .lock()
            .unwrap()
            .push((self.placement.to_string(), video.to_path_buf()));

        let name = video.file_stem().unwrap().to_string_lossy().into_owned();
        if name.starts_with("broken") {
            return Err(ExtractionError::InvalidConfig(format!("cannot decode {}", name)));
        }
        let mut streams = BTreeMap::new();
        streams.insert("rgb".to_string(), vec![vec![name.len() as f32, 1.0]]);
        Ok(Features::new(streams))
    }
}

fn fake_factory(calls: Calls) -> Arc<dyn ExtractorFactory> {
    Arc::new(
        move |placement: &Placement| -> Result<Box<dyn FeatureExtractor>, ExtractionError> {
            Ok(Box::new(FakeExtractor {
                placement: placement.clone(),
                calls: Arc::clone(&calls),
            }))
        },
    )
}

fn config_in(dir: &Path) -> ExtractionConfig {
    let mut config = ExtractionConfig::new(FeatureType::I3d, vec!["unused".to_string()]);
    config.tmp_path = dir.join("tmp");
    config.output_path = dir.join("output");
    config.on_extraction = OnExtraction::SaveJson;
    config
}

fn videos(names: &[&str]) -> WorkSet<PathBuf> {
    names.iter().map(|name| PathBuf::from(format!("/videos/{}.mp4", name))).collect()
}

// ============================================================
// Dispatching extraction
// ============================================================

#[test]
fn test_every_video_is_extracted_once_on_its_device() {
    let dir = temp_dir("all");
    let config = config_in(&dir);
    let calls: Calls = Arc::default();
    let set = videos(&["a", "b", "c", "d", "e"]);
    let progress = ProgressCounter::new(set.len());
    let prototype = ExtractionPrototype::new(
        &config,
        set.clone(),
        fake_factory(calls.clone()),
        progress.clone(),
    );
    let devices = DeviceList::parse(["0", "1"]).unwrap();

    dispatch_on_threads(set.len(), &devices, &prototype).unwrap();
    progress.close();

    let mut calls = calls.lock().unwrap().clone();
    calls.sort();
    assert_eq!(
        calls,
        vec![
            ("0".to_string(), PathBuf::from("/videos/a.mp4")),
            ("0".to_string(), PathBuf::from("/videos/b.mp4")),
            ("0".to_string(), PathBuf::from("/videos/c.mp4")),
            ("1".to_string(), PathBuf::from("/videos/d.mp4")),
            ("1".to_string(), PathBuf::from("/videos/e.mp4")),
        ]
    );
    assert_eq!(progress.completed(), 5);
    for name in ["a", "b", "c", "d", "e"] {
        assert!(dir.join("output").join(format!("{}_i3d.json", name)).is_file());
    }
}

#[test]
fn test_scratch_dirs_are_removed_unless_frames_are_kept() {
    let dir = temp_dir("scratch");
    let calls: Calls = Arc::default();
    let set = videos(&["a", "b"]);
    let devices = DeviceList::parse(["cuda:0", "cuda:1"]).unwrap();

    let config = config_in(&dir);
    let factory = fake_factory(calls.clone());
    let prototype =
        ExtractionPrototype::new(&config, set.clone(), factory, ProgressCounter::new(2));
    dispatch_on_threads(2, &devices, &prototype).unwrap();
    assert!(!dir.join("tmp").join("cuda_3a0").exists());
    assert!(!dir.join("tmp").join("cuda_3a1").exists());

    let mut config = config_in(&dir);
    config.keep_frames = true;
    let factory = fake_factory(calls);
    let prototype = ExtractionPrototype::new(&config, set, factory, ProgressCounter::new(2));
    dispatch_on_threads(2, &devices, &prototype).unwrap();
    let tmp = dir.join("tmp");
    assert!(tmp.join("cuda_3a0").join("0-a").join("frame_0001.jpg").is_file());
    assert!(tmp.join("cuda_3a1").join("1-b").join("frame_0001.jpg").is_file());
}

#[test]
fn test_lookalike_device_ids_get_separate_scratch_dirs() {
    let dir = temp_dir("lookalike");
    let calls: Calls = Arc::default();
    let set = videos(&["a", "b"]);
    let mut config = config_in(&dir);
    config.keep_frames = true;
    let factory = fake_factory(calls);
    let prototype = ExtractionPrototype::new(&config, set, factory, ProgressCounter::new(2));
    let devices = DeviceList::parse(["cuda:0", "cuda_0"]).unwrap();

    dispatch_on_threads(2, &devices, &prototype).unwrap();

    let colon = scratch_dir_for(&config.tmp_path, &Placement::Device("cuda:0".parse().unwrap()));
    let underscore =
        scratch_dir_for(&config.tmp_path, &Placement::Device("cuda_0".parse().unwrap()));
    assert_ne!(colon, underscore);
    assert_eq!(colon, dir.join("tmp").join("cuda_3a0"));
    assert_eq!(underscore, dir.join("tmp").join("cuda_5f0"));
    assert!(colon.join("0-a").join("frame_0001.jpg").is_file());
    assert!(underscore.join("1-b").join("frame_0001.jpg").is_file());
    assert!(!colon.join("1-b").exists());
}

#[test]
fn test_kept_frames_of_each_video_stay_separate() {
    let dir = temp_dir("per-video");
    let calls: Calls = Arc::default();
    let set: WorkSet<PathBuf> = ["/videos/a.mp4", "/videos/b.mp4", "/other/a.mp4"]
        .into_iter()
        .map(PathBuf::from)
        .collect();
    let mut config = config_in(&dir);
    config.keep_frames = true;
    let factory = fake_factory(calls);
    let prototype = ExtractionPrototype::new(&config, set, factory, ProgressCounter::new(3));

    dispatch_on_threads(3, &DeviceList::parse(["0"]).unwrap(), &prototype).unwrap();

    let scratch = dir.join("tmp").join("0");
    let mut kept: Vec<String> = fs::read_dir(&scratch)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    kept.sort();
    assert_eq!(kept, vec!["0-a", "1-b", "2-a"]);
    for name in &kept {
        assert!(scratch.join(name).join("frame_0001.jpg").is_file());
    }
}

#[test]
fn test_host_run_without_accelerators() {
    let dir = temp_dir("host");
    let config = config_in(&dir);
    let calls: Calls = Arc::default();
    let set = videos(&["a", "b", "c"]);
    let factory = fake_factory(calls.clone());
    let prototype = ExtractionPrototype::new(&config, set, factory, ProgressCounter::new(3));

    dispatch_on_threads(3, &DeviceList::host_only(), &prototype).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(placement, _)| placement == "host"));
}

#[test]
fn test_failed_videos_fault_only_their_device() {
    let dir = temp_dir("faults");
    let config = config_in(&dir);
    let calls: Calls = Arc::default();
    let set = videos(&["a", "broken", "c", "d"]);
    let progress = ProgressCounter::new(set.len());
    let factory = fake_factory(calls.clone());
    let prototype = ExtractionPrototype::new(&config, set, factory, progress.clone());

    let result = dispatch_on_threads(4, &DeviceList::parse(["0", "1"]).unwrap(), &prototype);

    match result {
        Err(DispatchError::Execution(faults)) => {
            assert_eq!(faults.len(), 1);
            assert_eq!(faults.first().placement.to_string(), "0");
            assert_eq!(faults.first().cause.to_string(), "1 video(s) failed on 0");
        }
        other => panic!("Expected execution fault, got {:?}", other),
    }
    assert_eq!(calls.lock().unwrap().len(), 4, "the rest of the partition still runs");
    assert_eq!(progress.completed(), 4);
    assert!(dir.join("output").join("a_i3d.json").is_file());
    assert!(!dir.join("output").join("broken_i3d.json").exists());
}

#[test]
fn test_factory_failure_is_a_placement_fault() {
    let dir = temp_dir("placement");
    let config = config_in(&dir);
    let factory: Arc<dyn ExtractorFactory> = Arc::new(
        |placement: &Placement| -> Result<Box<dyn FeatureExtractor>, ExtractionError> {
            Err(ExtractionError::InvalidConfig(format!("{} has no memory left", placement)))
        },
    );
    let prototype =
        ExtractionPrototype::new(&config, videos(&["a", "b"]), factory, ProgressCounter::new(2));

    let result = dispatch_on_threads(2, &DeviceList::parse(["0", "1"]).unwrap(), &prototype);

    assert!(matches!(result, Err(DispatchError::Placement { .. })));
    assert_eq!(prototype.progress().completed(), 0);
}

// ============================================================
// Sink and command backend
// ============================================================

#[test]
fn test_saved_features_round_trip_through_json() {
    let dir = temp_dir("sink");
    let sink = FeatureSink::new(OnExtraction::SaveJson, dir.clone(), FeatureType::Vggish);
    let mut streams = BTreeMap::new();
    streams.insert("vggish".to_string(), vec![vec![0.5, 0.25], vec![1.0, 2.0]]);
    let features = Features::new(streams);

    sink.emit(Path::new("/videos/talk.mkv"), &features).unwrap();

    let path = dir.join("talk_vggish.json");
    assert_eq!(sink.output_file(Path::new("/videos/talk.mkv")), path);
    let saved: Features = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved, features);
    assert_eq!(saved.shape("vggish"), Some((2, 2)));
}

#[test]
fn test_command_arguments_carry_device_and_options() {
    let mut config = ExtractionConfig::new(
        FeatureType::I3d,
        vec!["python".to_string(), "extract.py".to_string()],
    );
    config.i3d.extraction_fps = Some(25);
    let placement = Placement::Device("3".parse().unwrap());
    let extractor = CommandExtractor::new(Arc::new(config), placement);

    let args = extractor.arguments(Path::new("clip.mp4"), Path::new("/tmp/3"));

    assert_eq!(&args[..5], &["extract.py", "--video", "clip.mp4", "--device", "3"]);
    let fps = args.iter().position(|a| a == "--extraction-fps").unwrap();
    assert_eq!(args[fps + 1], "25");
    assert!(!args.contains(&"--show-kinetics-pred".to_string()));
}

#[cfg(unix)]
#[test]
fn test_command_extractor_parses_program_output() {
    let config = ExtractionConfig::new(
        FeatureType::Vggish,
        vec![
            "sh".to_string(),
            "-c".to_string(),
            r#"echo '{"vggish": [[1.0, 2.0, 3.0]]}'"#.to_string(),
            "extractor".to_string(),
        ],
    );
    let mut extractor = CommandExtractor::new(Arc::new(config), Placement::Host);

    let features = extractor
        .extract(Path::new("clip.mp4"), Path::new("/tmp"))
        .unwrap();

    assert_eq!(features.stream("vggish"), Some(&[vec![1.0, 2.0, 3.0]][..]));
}

#[cfg(unix)]
#[test]
fn test_command_extractor_reports_failing_program() {
    let config = ExtractionConfig::new(
        FeatureType::I3d,
        vec!["sh".to_string(), "-c".to_string(), "echo nope >&2; exit 3".to_string()],
    );
    let mut extractor = CommandExtractor::new(Arc::new(config), Placement::Host);

    match extractor.extract(Path::new("clip.mp4"), Path::new("/tmp")) {
        Err(ExtractionError::CommandFailed { stderr, .. }) => assert_eq!(stderr, "nope"),
        other => panic!("Expected command failure, got {:?}", other.map(|_| ())),
    }
}
