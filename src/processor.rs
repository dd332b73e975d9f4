//! Processing runs: discover, plan and merge every episode of every task.

use crate::config::{Config, GeneralConfig, ShowTask};
use crate::language::LanguageNames;
use crate::scanner::{
    order_groups, DiscoveredGroup, Discovery, EpisodeIdentityResolver, RenumberResolver, ScanError,
};
use crate::state::{RunGate, RunPermit, RunStatus, StatusSnapshot, StatusTracker};
use dubmerge_av::actions::{FfmpegTranscoder, Transcoder};
use dubmerge_av::merge::{EpisodeGroup, EpisodeKey, MergeItem, MergePlan, MergePlanner};
use dubmerge_av::probe::{FfprobeProber, Prober};
use dubmerge_av::{SyncError, Workspace};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Why one episode group was not merged.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("not enough usable sources: found {found}, need at least 2")]
    InsufficientSources { found: usize },

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("transcode failed: {0}")]
    Transcode(#[source] dubmerge_av::Error),

    #[error("workspace error: {0}")]
    Workspace(#[source] dubmerge_av::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters of one processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub merged: usize,
    pub skipped_existing: usize,
    pub skipped_insufficient: usize,
    pub failed: usize,
    pub skipped_tasks: usize,
    pub aborted_tasks: usize,
    pub cancelled: bool,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "{} merged, {} already present, {} with too few sources, {} failed",
            self.merged, self.skipped_existing, self.skipped_insufficient, self.failed
        )
    }
}

/// Result of asking for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Finished(RunReport),
    AlreadyRunning,
}

/// Where the merged file of `key` goes.
///
/// `<target>/<prefix> <season>/S<ss>E<ee> - <title>.<container>`
pub fn target_path(task: &ShowTask, general: &GeneralConfig, key: &EpisodeKey) -> PathBuf {
    task.target_path
        .join(format!("{} {}", general.season_dir_prefix, key.season))
        .join(format!(
            "{} - {}.{}",
            key.code(),
            sanitize_title(&key.title),
            general.container.extension()
        ))
}

/// Make a title usable as part of a file name.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') && !c.is_control())
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace()).to_string()
}

/// Runs merges for all configured tasks.
pub struct MergeService {
    config: Arc<Config>,
    prober: Arc<dyn Prober>,
    transcoder: Arc<dyn Transcoder>,
    languages: LanguageNames,
    gate: RunGate,
    status: StatusTracker,
}

impl MergeService {
    pub fn new(config: Arc<Config>, prober: Arc<dyn Prober>, transcoder: Arc<dyn Transcoder>) -> Self {
        let languages = LanguageNames::new(config.general.display_language);
        Self {
            config,
            prober,
            transcoder,
            languages,
            gate: RunGate::new(),
            status: StatusTracker::new(),
        }
    }

    /// Service using ffprobe and ffmpeg as configured in `[tools]`.
    pub fn from_config(config: Arc<Config>) -> Self {
        let prober = FfprobeProber::new(config.tools.ffprobe());
        let transcoder =
            FfmpegTranscoder::new(config.tools.ffmpeg()).with_timeout(config.tools.transcode_timeout());
        Self::new(config, Arc::new(prober), Arc::new(transcoder))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gate(&self) -> &RunGate {
        &self.gate
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    /// Run all tasks on the calling thread, unless a run is active.
    pub fn start_run(&self, cancel: &CancellationToken) -> RunOutcome {
        match self.acquire() {
            Some(permit) => RunOutcome::Finished(self.run_with_permit(permit, cancel)),
            None => RunOutcome::AlreadyRunning,
        }
    }

    /// Start a run on the blocking pool. Returns `None` if a run is active.
    pub fn spawn_run(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> Option<tokio::task::JoinHandle<RunReport>> {
        let permit = self.acquire()?;
        let service = Arc::clone(self);
        Some(tokio::task::spawn_blocking(move || {
            service.run_with_permit(permit, &cancel)
        }))
    }

    fn acquire(&self) -> Option<RunPermit> {
        let permit = self.gate.try_acquire();
        if permit.is_none() {
            tracing::warn!("Processing is already in progress.");
            self.status.message("Processing is already in progress.");
        }
        permit
    }

    fn run_with_permit(&self, _permit: RunPermit, cancel: &CancellationToken) -> RunReport {
        self.status.start("Processing started...");
        tracing::info!("Starting processing run over {} task(s)", self.config.tasks.len());

        let mut report = RunReport::default();
        let mut last_error = None;

        for task in &self.config.tasks {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if let Err(e) = self.process_task(task, cancel, &mut report) {
                tracing::error!("Task '{}' aborted: {}", task.title, e);
                report.aborted_tasks += 1;
                last_error = Some(format!("Task '{}' aborted: {}", task.title, e));
            }
        }

        let summary = report.summary();
        match (report.cancelled, last_error) {
            (true, _) => self
                .status
                .finish(RunStatus::Idle, format!("Processing cancelled: {summary}")),
            (false, Some(err)) => self.status.finish(RunStatus::Error, format!("{err} ({summary})")),
            (false, None) => self.status.finish(
                RunStatus::Completed,
                format!("Processing completed successfully: {summary}"),
            ),
        }
        tracing::info!("Processing run finished: {}", summary);
        report
    }

    fn process_task(
        &self,
        task: &ShowTask,
        cancel: &CancellationToken,
        report: &mut RunReport,
    ) -> Result<(), ScanError> {
        if !task.source_path.is_dir() {
            tracing::warn!(
                "Source {:?} of task '{}' does not exist, skipping",
                task.source_path,
                task.title
            );
            self.status.message(format!(
                "Source {} does not exist, task '{}' skipped.",
                task.source_path.display(),
                task.title
            ));
            report.skipped_tasks += 1;
            return Ok(());
        }

        if !task.target_path.exists() {
            tracing::info!("Target directory {:?} does not exist, creating it", task.target_path);
            std::fs::create_dir_all(&task.target_path)?;
        }

        let groups = self.discover(task)?;
        tracing::info!("Found {} unique episode(s) in task '{}'", groups.len(), task.title);
        if groups.is_empty() {
            self.status.message("No episodes found to process.");
            return Ok(());
        }

        let count = groups.len();
        for (i, group) in groups.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                tracing::info!("Run cancelled, stopping before {}", group.key);
                break;
            }

            let key = &group.key;
            tracing::info!(
                "[{}/{}] Processing {} (Season {}, Episode {})",
                i + 1,
                count,
                key.title,
                key.season,
                key.episode
            );

            let target = target_path(task, &self.config.general, key);
            match self.process_group(group, &target) {
                Ok(GroupResult::Merged) => report.merged += 1,
                Ok(GroupResult::Exists) => report.skipped_existing += 1,
                Err(GroupError::InsufficientSources { found }) => {
                    tracing::warn!(
                        "Not enough video files for {} (Season {}, Episode {}). Minimum 2 files required. Found {}.",
                        key.title,
                        key.season,
                        key.episode,
                        found
                    );
                    report.skipped_insufficient += 1;
                }
                Err(e) => {
                    tracing::error!("Error processing {}: {}", key, e);
                    report.failed += 1;
                }
            }
        }

        Ok(())
    }

    /// Discover, resolve identities and order the groups of `task`.
    pub fn discover(&self, task: &ShowTask) -> Result<Vec<DiscoveredGroup>, ScanError> {
        let mut groups = Discovery::new(&self.config.general).discover(task)?;
        RenumberResolver::new(task.renumber.clone()).resolve(&mut groups);
        order_groups(groups).inspect_err(|e| {
            if let ScanError::DuplicateGroupKey { keys } = e {
                tracing::error!("Duplicate episode keys found when ordering episodes: {}", keys.join(", "));
            }
        })
    }

    fn process_group(&self, group: &DiscoveredGroup, target: &Path) -> Result<GroupResult, GroupError> {
        if let Some(season_dir) = target.parent() {
            if !season_dir.exists() {
                std::fs::create_dir_all(season_dir)?;
                tracing::debug!("Target directory created: {:?}", season_dir);
            }
        }

        if group.files.len() < 2 {
            return Err(GroupError::InsufficientSources {
                found: group.files.len(),
            });
        }

        if target.exists() {
            tracing::info!("File already exists, skipping: {:?}", target);
            return Ok(GroupResult::Exists);
        }

        let plan = self.plan_group(group, target)?;

        let workspace = Workspace::for_target(target).map_err(GroupError::Workspace)?;
        let plan = plan.with_output(workspace.output());
        if let Err(e) = self.transcoder.transcode(&plan) {
            workspace.cleanup();
            return Err(GroupError::Transcode(e));
        }
        let created = workspace.finalize().map_err(GroupError::Workspace)?;

        tracing::info!("created {}", created.display());
        Ok(GroupResult::Merged)
    }

    /// Probe the files of `group` and build its merge plan, writing to `target`.
    pub fn plan_group(&self, group: &DiscoveredGroup, target: &Path) -> Result<MergePlan, GroupError> {
        let items = self.probe_items(group);
        if items.len() < 2 {
            return Err(GroupError::InsufficientSources { found: items.len() });
        }

        let episode = EpisodeGroup::new(group.key.clone(), items);
        let planner = MergePlanner::new(self.config.sync.plan_options(), &self.languages);
        Ok(planner.build(&episode, &group.overrides(), target)?)
    }

    /// Dry run for one episode: discover, probe and plan, without merging.
    pub fn plan_episode(&self, task_title: &str, season: u32, episode: u32) -> anyhow::Result<MergePlan> {
        let task = self
            .config
            .tasks
            .iter()
            .find(|t| t.title.eq_ignore_ascii_case(task_title))
            .ok_or_else(|| anyhow::anyhow!("No task named '{}'", task_title))?;

        let groups = self.discover(task)?;
        let group = groups
            .iter()
            .find(|g| g.key.season == season && g.key.episode == episode)
            .ok_or_else(|| {
                anyhow::anyhow!("No files found for season {} episode {} in task '{}'", season, episode, task.title)
            })?;

        let target = target_path(task, &self.config.general, &group.key);
        Ok(self.plan_group(group, &target)?)
    }

    fn probe_items(&self, group: &DiscoveredGroup) -> Vec<MergeItem> {
        let probed: Vec<_> = group
            .files
            .par_iter()
            .map(|file| (file, self.prober.probe_facts(&file.path)))
            .collect();

        probed
            .into_iter()
            .filter_map(|(file, facts)| match facts {
                Ok(facts) => Some(MergeItem::new(
                    file.path.clone(),
                    facts,
                    Some(file.language.clone()),
                )),
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", file.path, e);
                    None
                }
            })
            .collect()
    }
}

enum GroupResult {
    Merged,
    Exists,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_path_follows_library_layout() {
        let task = ShowTask {
            title: "Show".into(),
            description: String::new(),
            source_path: "/src".into(),
            target_path: "/library/Show".into(),
            regex_mapping: Vec::new(),
            manual_mapping: Vec::new(),
            renumber: Vec::new(),
        };
        let path = target_path(&task, &GeneralConfig::default(), &EpisodeKey::new("Pilot", 1, 2));
        assert_eq!(path, PathBuf::from("/library/Show/Season 1/S01E02 - Pilot.mkv"));
    }

    #[test]
    fn sanitizes_titles() {
        assert_eq!(sanitize_title("Part 1: The  Beginning?"), "Part 1 The Beginning");
        assert_eq!(sanitize_title("AC/DC"), "ACDC");
        assert_eq!(sanitize_title("Ending..."), "Ending");
    }

    #[test]
    fn report_summary_lists_counters() {
        let report = RunReport {
            merged: 2,
            failed: 1,
            ..RunReport::default()
        };
        assert_eq!(
            report.summary(),
            "2 merged, 0 already present, 0 with too few sources, 1 failed"
        );
    }
}
