//! Merge plan emission.
//!
//! A [`MergePlan`] is a transport-agnostic description of one merge: inputs,
//! filter graph, stream maps, codecs and track metadata. Rendering it into a
//! command line is left to [`crate::actions`].

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{
    classify, compile_filter_graph, filter_steps, AudioCodec, Classification, CodecChoice,
    EpisodeGroup, FilterFragment, FilterOptions, LanguageTag, ManualOverrides, SyncThresholds,
    TrimStrategy,
};
use crate::SyncError;

/// Turns language tags into track metadata.
pub trait LanguageResolver: Send + Sync {
    /// Track title, e.g. `English` or `Deutsch`.
    fn display_name(&self, tag: &LanguageTag) -> String;

    /// Two-letter code written into the language tag of the track.
    fn iso_code(&self, tag: &LanguageTag) -> String;
}

/// One input file, optionally cut at its source boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub path: PathBuf,
    /// Start reading at this source position.
    #[serde(serialize_with = "serialize_secs")]
    pub seek: Option<Duration>,
    /// Stop reading at this source position.
    #[serde(serialize_with = "serialize_secs")]
    pub end_seek: Option<Duration>,
}

fn serialize_secs<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&d.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

/// Kind of a raw input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    fn specifier(&self) -> char {
        match self {
            MediaKind::Video => 'v',
            MediaKind::Audio => 'a',
        }
    }
}

/// Source of an output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMap {
    /// A raw stream of an input, `input:kind:stream`.
    Stream {
        input: usize,
        media: MediaKind,
        stream: usize,
    },
    /// A filter graph output label.
    Label(String),
}

impl fmt::Display for StreamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMap::Stream {
                input,
                media,
                stream,
            } => write!(f, "{}:{}:{}", input, media.specifier(), stream),
            StreamMap::Label(label) => write!(f, "[{label}]"),
        }
    }
}

impl Serialize for StreamMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One audio track of the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioTrackPlan {
    /// Output audio stream ordinal; equals the source item's index.
    pub index: usize,
    pub map: StreamMap,
    pub codec: CodecChoice,
    pub title: String,
    pub language: String,
    /// Clear the default disposition on this track.
    pub clear_default: bool,
}

/// Everything the transcoding engine needs to produce one merged file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergePlan {
    pub inputs: Vec<InputSpec>,
    pub filter_graph: String,
    pub video_map: StreamMap,
    pub audio_tracks: Vec<AudioTrackPlan>,
    pub output: PathBuf,
    /// Per-input timing outcome, in input order.
    pub classifications: Vec<Classification>,
}

impl MergePlan {
    /// The same plan writing to `output`.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Whether every audio track is copied untouched.
    pub fn is_copy_only(&self) -> bool {
        self.audio_tracks.iter().all(|t| t.codec.is_copy())
    }
}

/// Knobs of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanOptions {
    pub thresholds: SyncThresholds,
    pub filter: FilterOptions,
    /// Codec for tracks that have to be re-encoded.
    pub audio_codec: AudioCodec,
}

/// Builds merge plans for episode groups.
///
/// The planner holds no per-group state; the same instance can be reused
/// for any number of groups, from any thread.
pub struct MergePlanner<'a> {
    options: PlanOptions,
    languages: &'a dyn LanguageResolver,
}

impl<'a> MergePlanner<'a> {
    pub fn new(options: PlanOptions, languages: &'a dyn LanguageResolver) -> Self {
        Self { options, languages }
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Classify `group` and describe the merge writing to `output`.
    ///
    /// The group itself is left untouched; corrections are applied to copies
    /// of its items.
    pub fn build(
        &self,
        group: &EpisodeGroup,
        overrides: &ManualOverrides,
        output: &Path,
    ) -> Result<MergePlan, SyncError> {
        let classified = classify(group.items.clone(), overrides, &self.options.thresholds)?;
        let reference = classified.reference();

        let mut inputs = Vec::with_capacity(classified.items.len());
        let mut fragments = Vec::with_capacity(classified.items.len());
        let mut audio_tracks = Vec::with_capacity(classified.items.len());

        for item in &classified.items {
            let language = item.language().ok_or_else(|| SyncError::MissingLanguage {
                path: item.source_path().to_path_buf(),
            })?;

            let seek = (self.options.filter.trim_strategy == TrimStrategy::InputSeek
                && item.start_cut_frames() > 0.0)
                .then(|| item.start_cut_duration());
            let input = InputSpec {
                path: item.source_path().to_path_buf(),
                seek,
                end_seek: item.duration_to_end(),
            };

            let fragment = FilterFragment::new(
                item.index(),
                filter_steps(item, reference, &self.options.filter),
            );

            let map = if fragment.is_empty() {
                StreamMap::Stream {
                    input: item.index(),
                    media: MediaKind::Audio,
                    stream: 0,
                }
            } else {
                StreamMap::Label(fragment.output_label())
            };

            let untouched = fragment.is_empty() && input.seek.is_none() && input.end_seek.is_none();
            let codec = if untouched {
                CodecChoice::Copy
            } else {
                CodecChoice::Encode(self.options.audio_codec)
            };

            audio_tracks.push(AudioTrackPlan {
                index: item.index(),
                map,
                codec,
                title: self.languages.display_name(language),
                language: self.languages.iso_code(language),
                clear_default: true,
            });
            inputs.push(input);
            fragments.push(fragment);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Planned {} with {} inputs, reference {:?}",
            group.key,
            inputs.len(),
            reference.source_path()
        );

        Ok(MergePlan {
            inputs,
            filter_graph: compile_filter_graph(&fragments),
            video_map: StreamMap::Stream {
                input: 0,
                media: MediaKind::Video,
                stream: 0,
            },
            audio_tracks,
            output: output.to_path_buf(),
            classifications: classified.outcomes,
        })
    }
}

/// Build a merge plan for `group` in one call.
pub fn build_merge_plan(
    group: &EpisodeGroup,
    overrides: &ManualOverrides,
    options: PlanOptions,
    languages: &dyn LanguageResolver,
    output: &Path,
) -> Result<MergePlan, SyncError> {
    MergePlanner::new(options, languages).build(group, overrides, output)
}
