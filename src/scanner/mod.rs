//! Source discovery.
//!
//! A task's source tree holds one folder per language:
//!
//! ```text
//! <source_path>/
//!   English/Show S01E01.mkv
//!   de/Show S01E01.webm
//! ```
//!
//! Files are identified, grouped by episode and ordered for processing.

pub mod identifier;

use crate::config::{GeneralConfig, RenumberRule, ShowTask};
use crate::language::LanguageDetector;
use dubmerge_av::merge::{EpisodeKey, LanguageTag, ManualOverride, ManualOverrides};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub use identifier::{EpisodeIdentifier, Identification};

/// Errors that stop discovery for a whole task.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("source directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("duplicate episode keys: {}", .keys.join(", "))]
    DuplicateGroupKey { keys: Vec<String> },

    #[error("invalid pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One source file with its resolved language.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub language: LanguageTag,
    pub manual_override: Option<ManualOverride>,
}

/// All files of one episode.
#[derive(Debug, Clone)]
pub struct DiscoveredGroup {
    pub key: EpisodeKey,
    pub files: Vec<DiscoveredFile>,
}

impl DiscoveredGroup {
    /// Manual overrides keyed by path.
    pub fn overrides(&self) -> ManualOverrides {
        self.files
            .iter()
            .filter_map(|f| f.manual_override.map(|o| (f.path.clone(), o)))
            .collect()
    }

    /// `"<title> S<s>E<e>"`, as used in collision reports.
    pub fn label(&self) -> String {
        format!("{} S{}E{}", self.key.title, self.key.season, self.key.episode)
    }
}

/// Walks a task's source tree.
pub struct Discovery<'a> {
    general: &'a GeneralConfig,
    detector: LanguageDetector,
}

impl<'a> Discovery<'a> {
    pub fn new(general: &'a GeneralConfig) -> Self {
        Self {
            general,
            detector: LanguageDetector::new(),
        }
    }

    /// Find and group all episode files of `task`, in discovery order.
    pub fn discover(&self, task: &ShowTask) -> Result<Vec<DiscoveredGroup>, ScanError> {
        if !task.source_path.is_dir() {
            return Err(ScanError::SourceMissing(task.source_path.clone()));
        }

        let identifier = EpisodeIdentifier::for_task(task)?;
        let default_language = self.default_language();

        let mut groups: Vec<DiscoveredGroup> = Vec::new();
        let mut positions: HashMap<EpisodeKey, usize> = HashMap::new();

        let entries = WalkDir::new(&task.source_path)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() || !self.general.is_allowed(entry.path()) {
                continue;
            }

            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy();
            let Some(id) = identifier.identify(&file_name) else {
                debug!("No episode pattern matched for file {}", file_name);
                continue;
            };

            let language = self.file_language(path, id.language.as_deref(), &default_language);
            let key = EpisodeKey::new(id.title, id.season, id.episode);

            debug!(
                "Found: {} (Season {}, Episode {}) in {:?} with language {}",
                key.title, key.season, key.episode, path, language
            );

            let file = DiscoveredFile {
                path: path.to_path_buf(),
                language,
                manual_override: id.manual_override,
            };

            match positions.get(&key) {
                Some(&i) => groups[i].files.push(file),
                None => {
                    positions.insert(key.clone(), groups.len());
                    groups.push(DiscoveredGroup {
                        key,
                        files: vec![file],
                    });
                }
            }
        }

        Ok(groups)
    }

    fn default_language(&self) -> LanguageTag {
        self.detector
            .detect(&self.general.language)
            .unwrap_or_else(|| LanguageTag::new(self.general.language.clone()))
    }

    /// Manual mapping > file stem > parent folder > configured default.
    fn file_language(&self, path: &Path, manual: Option<&str>, default: &LanguageTag) -> LanguageTag {
        if let Some(manual) = manual {
            match self.detector.detect(manual) {
                Some(tag) => return tag,
                None => warn!("Invalid language code in manual mapping: {}", manual),
            }
        }

        let stem = path.file_stem().map(|s| s.to_string_lossy());
        let folder = path
            .parent()
            .and_then(Path::file_name)
            .map(|s| s.to_string_lossy());

        stem.and_then(|s| self.detector.detect(&s))
            .or_else(|| folder.and_then(|f| self.detector.detect(&f)))
            .unwrap_or_else(|| default.clone())
    }
}

/// Rewrites episode identities after discovery.
pub trait EpisodeIdentityResolver {
    fn resolve(&self, groups: &mut [DiscoveredGroup]);
}

/// Applies `[[tasks.renumber]]` entries.
#[derive(Debug, Clone, Default)]
pub struct RenumberResolver {
    rules: Vec<RenumberRule>,
}

impl RenumberResolver {
    pub fn new(rules: Vec<RenumberRule>) -> Self {
        Self { rules }
    }
}

impl EpisodeIdentityResolver for RenumberResolver {
    fn resolve(&self, groups: &mut [DiscoveredGroup]) {
        for group in groups.iter_mut() {
            let Some(rule) = self.rules.iter().find(|r| {
                r.from_season == group.key.season && r.from_episode == group.key.episode
            }) else {
                continue;
            };

            let title = rule.title.clone().unwrap_or_else(|| group.key.title.clone());
            let key = EpisodeKey::new(title, rule.season, rule.episode);
            debug!("Renumbered {} to {}", group.key, key);
            group.key = key;
        }
    }
}

/// Sort groups by (season, episode), refusing colliding keys.
pub fn order_groups(mut groups: Vec<DiscoveredGroup>) -> Result<Vec<DiscoveredGroup>, ScanError> {
    groups.sort_by(|a, b| a.key.cmp(&b.key));

    if groups.windows(2).any(|w| w[0].key == w[1].key) {
        let mut keys: Vec<String> = groups.iter().map(DiscoveredGroup::label).collect();
        keys.sort();
        return Err(ScanError::DuplicateGroupKey { keys });
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(title: &str, season: u32, episode: u32) -> DiscoveredGroup {
        DiscoveredGroup {
            key: EpisodeKey::new(title, season, episode),
            files: Vec::new(),
        }
    }

    #[test]
    fn orders_by_season_then_episode() {
        let ordered = order_groups(vec![group("c", 2, 1), group("b", 1, 3), group("a", 1, 1)]).unwrap();
        let labels: Vec<_> = ordered.iter().map(DiscoveredGroup::label).collect();
        assert_eq!(labels, ["a S1E1", "b S1E3", "c S2E1"]);
    }

    #[test]
    fn colliding_keys_list_every_group() {
        let err = order_groups(vec![group("Zeta", 1, 1), group("Alpha", 1, 1), group("Beta", 1, 2)])
            .unwrap_err();
        match err {
            ScanError::DuplicateGroupKey { keys } => {
                assert_eq!(keys, ["Alpha S1E1", "Beta S1E2", "Zeta S1E1"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn renumber_uses_original_keys() {
        let resolver = RenumberResolver::new(vec![
            RenumberRule {
                from_season: 1,
                from_episode: 1,
                season: 1,
                episode: 2,
                title: None,
            },
            RenumberRule {
                from_season: 1,
                from_episode: 2,
                season: 1,
                episode: 1,
                title: Some("Renamed".into()),
            },
        ]);
        let mut groups = vec![group("First", 1, 1), group("Second", 1, 2)];
        resolver.resolve(&mut groups);

        assert_eq!(groups[0].label(), "First S1E2");
        assert_eq!(groups[1].label(), "Renamed S1E1");
        assert!(order_groups(groups).is_ok());
    }

    #[test]
    fn overrides_are_keyed_by_path() {
        let mut g = group("a", 1, 1);
        g.files.push(DiscoveredFile {
            path: PathBuf::from("/src/de/a.mkv"),
            language: LanguageTag::new("deu"),
            manual_override: Some(ManualOverride::default()),
        });
        g.files.push(DiscoveredFile {
            path: PathBuf::from("/src/en/a.mkv"),
            language: LanguageTag::new("eng"),
            manual_override: None,
        });
        let overrides = g.overrides();
        assert_eq!(overrides.len(), 1);
        assert!(overrides.contains_key(Path::new("/src/de/a.mkv")));
    }
}
