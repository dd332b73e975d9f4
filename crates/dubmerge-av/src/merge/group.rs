//! Episode identity and the set of files believed to be one episode.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use super::MergeItem;

/// Identity of an episode.
///
/// Two keys are equal when season and episode number match. The title is
/// carried along for naming but ignored by equality, hashing and ordering,
/// since different sources spell it differently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeKey {
    pub title: String,
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    pub fn new(title: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            title: title.into(),
            season,
            episode,
        }
    }

    /// `S01E02` style code.
    pub fn code(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }
}

impl PartialEq for EpisodeKey {
    fn eq(&self, other: &Self) -> bool {
        self.season == other.season && self.episode == other.episode
    }
}

impl Eq for EpisodeKey {}

impl Hash for EpisodeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.season.hash(state);
        self.episode.hash(state);
    }
}

impl PartialOrd for EpisodeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EpisodeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.season, self.episode).cmp(&(other.season, other.episode))
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.title, self.code())
    }
}

/// The probed files of one episode.
#[derive(Debug, Clone)]
pub struct EpisodeGroup {
    pub key: EpisodeKey,
    pub items: Vec<MergeItem>,
}

impl EpisodeGroup {
    pub fn new(key: EpisodeKey, items: Vec<MergeItem>) -> Self {
        Self { key, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A merge needs at least two sources.
    pub fn is_mergeable(&self) -> bool {
        self.items.len() >= 2
    }
}

/// A hand-written correction for one source file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualOverride {
    /// Frames to drop from the start.
    pub remove_frames: f64,
    /// Trim the end so the file matches the reference length.
    pub patch_outro: bool,
    /// Explicit audio speed factor.
    pub speed_multiplier: f64,
}

impl Default for ManualOverride {
    fn default() -> Self {
        Self {
            remove_frames: 0.0,
            patch_outro: false,
            speed_multiplier: 1.0,
        }
    }
}

/// Manual overrides keyed by source path.
pub type ManualOverrides = HashMap<PathBuf, ManualOverride>;
