//! Media file probing.
//!
//! The synchronization engine only needs a handful of stream facts per file
//! (see [`ProbedFacts`]). They are obtained through a [`Prober`]; the default
//! backend shells out to `ffprobe`.

#[cfg(feature = "probe")]
mod ffprobe;
mod types;

#[cfg(feature = "probe")]
pub use ffprobe::{parse_ffprobe_json, FfprobeProber};
pub use types::*;

use crate::Result;
use std::path::Path;

/// A media probing backend.
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe a media file at the given path and extract metadata.
    fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Probe a file and reduce the result to the facts a merge needs.
    fn probe_facts(&self, path: &Path) -> Result<ProbedFacts> {
        let info = self.probe(path)?;
        ProbedFacts::from_media_info(&info)
    }
}
