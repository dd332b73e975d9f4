//! Episode identification from file names.
//!
//! Manual mappings are consulted first, then the task's regex patterns in
//! order. The first hit wins.

use super::ScanError;
use crate::config::{ManualMapping, ShowTask};
use dubmerge_av::merge::ManualOverride;
use regex::Regex;
use tracing::{debug, warn};

/// What a file name says about its episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub title: String,
    pub season: u32,
    pub episode: u32,
    /// Language forced by a manual mapping.
    pub language: Option<String>,
    /// Timing correction from a manual mapping.
    pub manual_override: Option<ManualOverride>,
}

/// Identifies files of one task.
#[derive(Debug, Clone)]
pub struct EpisodeIdentifier {
    manual: Vec<ManualMapping>,
    patterns: Vec<Regex>,
}

impl EpisodeIdentifier {
    /// Compile the task's patterns.
    pub fn for_task(task: &ShowTask) -> Result<Self, ScanError> {
        let patterns = task
            .regex_mapping
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| ScanError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            manual: task.manual_mapping.clone(),
            patterns,
        })
    }

    /// Identify the file called `file_name`.
    pub fn identify(&self, file_name: &str) -> Option<Identification> {
        if let Some(mapping) = self.manual.iter().find(|m| m.matches(file_name)) {
            return identify_manual(mapping, file_name);
        }

        self.patterns
            .iter()
            .find_map(|re| identify_with_pattern(re, file_name))
    }
}

fn identify_manual(mapping: &ManualMapping, file_name: &str) -> Option<Identification> {
    let (Some(season), Some(episode)) = (mapping.season, mapping.episode_number) else {
        warn!(
            "Manual mapping '{}' matched {} but has no season or episode number, skipping",
            mapping.new_title, file_name
        );
        return None;
    };

    Some(Identification {
        title: mapping.new_title.clone(),
        season,
        episode,
        language: mapping.language.clone().filter(|l| !l.trim().is_empty()),
        manual_override: Some(mapping.to_override()),
    })
}

fn identify_with_pattern(re: &Regex, file_name: &str) -> Option<Identification> {
    let caps = re.captures(file_name)?;
    let title = caps.name("name")?.as_str().trim().to_string();
    let season = caps.name("season")?.as_str().trim().parse().ok();
    let episode = caps.name("episode")?.as_str().trim().parse().ok();

    match (season, episode) {
        (Some(season), Some(episode)) => Some(Identification {
            title,
            season,
            episode,
            language: None,
            manual_override: None,
        }),
        _ => {
            debug!("Pattern {} matched {} without numeric season/episode", re, file_name);
            None
        }
    }
}
