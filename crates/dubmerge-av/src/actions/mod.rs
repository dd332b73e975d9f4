//! Executing merge plans.
//!
//! [`ffmpeg_args`] renders a [`MergePlan`](crate::merge::MergePlan) into an
//! ffmpeg argument vector; a [`Transcoder`] runs it.

mod transcode;

pub use transcode::{ffmpeg_args, FfmpegTranscoder, Transcoder, DEFAULT_TIMEOUT};
