//! # dubmerge-av
//!
//! Synchronization and merge planning for per-language recordings of the
//! same episode.
//!
//! This crate provides functionality for:
//! - Probing media files for the stream facts a merge needs
//! - Classifying the timing of several sources against a reference
//! - Building audio filter graphs and transport-agnostic merge plans
//! - Executing merge plans with ffmpeg
//!
//! ## Features
//!
//! - `probe` (default) - Probing through the ffprobe CLI
//! - `transcode` (default) - Executing merge plans with the ffmpeg CLI
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use dubmerge_av::probe::{FfprobeProber, Prober};
//! use std::path::Path;
//!
//! let info = FfprobeProber::default().probe(Path::new("/path/to/episode.mkv"))?;
//! println!("Container: {}", info.container);
//! # Ok::<(), dubmerge_av::Error>(())
//! ```

mod container;
mod error;
pub mod merge;
pub mod probe;
pub mod tools;
pub mod workspace;

#[cfg(feature = "transcode")]
pub mod actions;

// Re-exports
pub use container::Container;
pub use error::{Error, Result, SyncError};
pub use merge::{build_merge_plan, EpisodeGroup, EpisodeKey, MergeItem, MergePlan};
pub use probe::{AudioTrack, MediaInfo, ProbedFacts, Prober, VideoTrack};
pub use tools::{check_tool, check_tools, require_tool, tool_path, ToolInfo};
pub use workspace::Workspace;
