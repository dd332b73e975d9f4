//! Loading full configuration files from disk.

use dubmerge::config::{load_config, load_config_or_default, DisplayLanguage};
use dubmerge_av::merge::{AudioCodec, TrimStrategy};
use dubmerge_av::Container;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

const FULL: &str = r#"
[general]
language = "de"
display_language = "native"
allowed_extensions = ["mkv", "webm"]
processing_interval_secs = 3600
container = "mp4"

[sync]
max_drift_frames = 12
trim_strategy = "input_seek"
audio_codec = "opus"

[tools]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
transcode_timeout_secs = 600

[server]
host = "127.0.0.1"
port = 9090

[[tasks]]
title = "Bubbler"
description = "Seasons 1-3"
source_path = "/downloads/bubbler"
target_path = "/library/Bubbler"
regex_mapping = [
    '^(?<name>.+?) S(?<season>\d+)E(?<episode>\d+)',
    '^(?<name>.+?) (?<season>\d+)x(?<episode>\d+)',
]

[[tasks.manual_mapping]]
new_title = "Origins"
path = "origins"
season = 2
episode_number = 25
language = "fr"
remove_frames = 720
speed_multiplier = 1.04

[[tasks.renumber]]
from_season = 0
from_episode = 1
season = 1
episode = 26
"#;

#[test]
fn loads_every_section() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dubmerge.toml");
    fs::write(&path, FULL).unwrap();

    let config = load_config(&path).unwrap();

    assert_eq!(config.general.language, "de");
    assert_eq!(config.general.display_language, DisplayLanguage::Native);
    assert_eq!(config.general.processing_interval(), Duration::from_secs(3600));
    assert_eq!(config.general.container, Container::Mp4);
    assert_eq!(config.general.season_dir_prefix, "Season");

    let options = config.sync.plan_options();
    assert_eq!(options.thresholds.max_drift_frames, 12.0);
    assert_eq!(options.thresholds.intro_frames, 720.0);
    assert_eq!(options.filter.trim_strategy, TrimStrategy::InputSeek);
    assert_eq!(options.audio_codec, AudioCodec::Opus);

    assert_eq!(config.tools.ffmpeg().to_str(), Some("/opt/ffmpeg/bin/ffmpeg"));
    assert_eq!(config.tools.transcode_timeout(), Duration::from_secs(600));
    assert_eq!(config.server.port, 9090);

    let task = &config.tasks[0];
    assert_eq!(task.regex_mapping.len(), 2);
    let mapping = &task.manual_mapping[0];
    assert!(mapping.matches("Bubbler ORIGINS part 1.mkv"));
    assert_eq!(mapping.to_override().speed_multiplier, 1.04);
    assert!(!mapping.patch_outro);
    assert_eq!(task.renumber[0].episode, 26);
}

#[test]
fn reports_the_file_on_parse_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[general\nlanguage = ").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
}

#[test]
fn rejects_unknown_codecs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("codec.toml");
    fs::write(&path, "[sync]\naudio_codec = \"mp3\"\n").unwrap();

    assert!(load_config(&path).is_err());
}

#[test]
fn rejects_duplicate_task_titles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupes.toml");
    let task = "[[tasks]]\ntitle = \"Show\"\nsource_path = \"/a\"\ntarget_path = \"/b\"\n";
    fs::write(&path, format!("{task}{}", task.replace("Show", "show"))).unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate task title"));
}

#[test]
fn explicit_path_must_exist() {
    let dir = tempdir().unwrap();
    assert!(load_config_or_default(Some(&dir.path().join("missing.toml"))).is_err());
}
