//! Synchronization and merge planning.
//!
//! Data flows one way:
//!
//! ```text
//! ProbedFacts -> MergeItem -> classify -> filter steps -> MergePlan
//! ```
//!
//! The shortest item of an [`EpisodeGroup`] is the reference. Every other
//! item is cut or retimed against it, and the resulting [`MergePlan`] maps
//! the reference's picture plus one audio track per item.
//!
//! # Example
//!
//! ```
//! use dubmerge_av::merge::{
//!     build_merge_plan, EpisodeGroup, EpisodeKey, LanguageResolver, LanguageTag,
//!     ManualOverrides, MergeItem, PlanOptions,
//! };
//! use dubmerge_av::probe::ProbedFacts;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! struct Codes;
//!
//! impl LanguageResolver for Codes {
//!     fn display_name(&self, tag: &LanguageTag) -> String {
//!         tag.to_string()
//!     }
//!     fn iso_code(&self, tag: &LanguageTag) -> String {
//!         tag.as_str()[..2].to_string()
//!     }
//! }
//!
//! let facts = |secs| ProbedFacts {
//!     frame_rate: 25.0,
//!     duration: Duration::from_secs_f64(secs),
//!     has_video: true,
//!     has_audio: true,
//! };
//! let group = EpisodeGroup::new(
//!     EpisodeKey::new("Pilot", 1, 1),
//!     vec![
//!         MergeItem::new("/en/pilot.mkv", facts(400.0), Some(LanguageTag::new("eng"))),
//!         MergeItem::new("/de/pilot.mkv", facts(428.8), Some(LanguageTag::new("deu"))),
//!     ],
//! );
//!
//! let plan = build_merge_plan(
//!     &group,
//!     &ManualOverrides::new(),
//!     PlanOptions::default(),
//!     &Codes,
//!     Path::new("/out/S01E01 - Pilot.mkv"),
//! )?;
//! assert_eq!(plan.filter_graph, "[1:a]atrim=start=28.8,asetpts=PTS-STARTPTS[a1]");
//! # Ok::<(), dubmerge_av::SyncError>(())
//! ```

mod classify;
mod codec;
mod filter;
mod group;
mod item;
mod plan;

pub use classify::{
    classify, classify_ordered, order_items, Classification, ClassifiedGroup, SyncThresholds,
};
pub use codec::{AudioCodec, CodecChoice};
pub use filter::{
    compile_filter_graph, filter_steps, FilterFragment, FilterOptions, FilterStep, TrimStrategy,
};
pub use group::{EpisodeGroup, EpisodeKey, ManualOverride, ManualOverrides};
pub use item::{Correction, LanguageTag, MergeItem};
pub use plan::{
    build_merge_plan, AudioTrackPlan, InputSpec, LanguageResolver, MediaKind, MergePlan,
    MergePlanner, PlanOptions, StreamMap,
};
