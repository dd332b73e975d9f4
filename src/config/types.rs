use dubmerge_av::merge::{
    AudioCodec, FilterOptions, ManualOverride, PlanOptions, SyncThresholds, TrimStrategy,
};
use dubmerge_av::Container;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tasks: Vec<ShowTask>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Language of files whose name and folder reveal none.
    #[serde(default = "default_language")]
    pub language: String,

    /// Which language name becomes the audio track title.
    #[serde(default)]
    pub display_language: DisplayLanguage,

    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Seconds between scheduled runs (default: 12 hours)
    #[serde(default = "default_processing_interval")]
    pub processing_interval_secs: u64,

    #[serde(default = "default_season_dir_prefix")]
    pub season_dir_prefix: String,

    #[serde(default)]
    pub container: Container,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    ["mkv", "mp4", "webm", "m4v", "mov", "avi"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_processing_interval() -> u64 {
    12 * 60 * 60
}

fn default_season_dir_prefix() -> String {
    "Season".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            display_language: DisplayLanguage::default(),
            allowed_extensions: default_allowed_extensions(),
            processing_interval_secs: default_processing_interval(),
            season_dir_prefix: default_season_dir_prefix(),
            container: Container::default(),
        }
    }
}

impl GeneralConfig {
    pub fn processing_interval(&self) -> Duration {
        Duration::from_secs(self.processing_interval_secs)
    }

    /// Case-insensitive extension check.
    pub fn is_allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.allowed_extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLanguage {
    /// `German`
    #[default]
    English,
    /// `Deutsch`
    Native,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default = "default_intro_frames")]
    pub intro_frames: f64,

    #[serde(default = "default_intro_tolerance")]
    pub intro_tolerance_frames: f64,

    #[serde(default = "default_max_drift")]
    pub max_drift_frames: f64,

    #[serde(default = "default_half_second")]
    pub sync_tolerance_secs: f64,

    #[serde(default = "default_half_second")]
    pub speed_tolerance_secs: f64,

    #[serde(default)]
    pub trim_strategy: TrimStrategy,

    /// Codec for corrected tracks.
    #[serde(default)]
    pub audio_codec: AudioCodec,
}

fn default_intro_frames() -> f64 {
    720.0
}

fn default_intro_tolerance() -> f64 {
    2.0
}

fn default_max_drift() -> f64 {
    10.0
}

fn default_half_second() -> f64 {
    0.5
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            intro_frames: default_intro_frames(),
            intro_tolerance_frames: default_intro_tolerance(),
            max_drift_frames: default_max_drift(),
            sync_tolerance_secs: default_half_second(),
            speed_tolerance_secs: default_half_second(),
            trim_strategy: TrimStrategy::default(),
            audio_codec: AudioCodec::default(),
        }
    }
}

impl SyncConfig {
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            thresholds: SyncThresholds {
                intro_frames: self.intro_frames,
                intro_tolerance_frames: self.intro_tolerance_frames,
                max_drift_frames: self.max_drift_frames,
                sync_tolerance_secs: self.sync_tolerance_secs,
            },
            filter: FilterOptions {
                speed_tolerance_secs: self.speed_tolerance_secs,
                trim_strategy: self.trim_strategy,
            },
            audio_codec: self.audio_codec,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Upper bound for one ffmpeg run (default: 6 hours)
    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,
}

fn default_transcode_timeout() -> u64 {
    6 * 60 * 60
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            transcode_timeout_secs: default_transcode_timeout(),
        }
    }
}

impl ToolsConfig {
    /// The ffmpeg to run: the configured path, or the one found on `PATH`.
    pub fn ffmpeg(&self) -> PathBuf {
        resolve_tool("ffmpeg", self.ffmpeg_path.as_deref())
    }

    pub fn ffprobe(&self) -> PathBuf {
        resolve_tool("ffprobe", self.ffprobe_path.as_deref())
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

// Unresolvable tools keep their configured or bare name so that running them
// reports the tool as missing.
fn resolve_tool(name: &str, configured: Option<&Path>) -> PathBuf {
    dubmerge_av::tool_path(name, configured).unwrap_or_else(|_| {
        configured
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(name))
    })
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// One show: a source tree of per-language folders and a target library.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShowTask {
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub source_path: PathBuf,

    pub target_path: PathBuf,

    /// Patterns with `name`, `season` and `episode` groups, tried in order.
    #[serde(default)]
    pub regex_mapping: Vec<String>,

    #[serde(default)]
    pub manual_mapping: Vec<ManualMapping>,

    #[serde(default)]
    pub renumber: Vec<RenumberRule>,
}

/// Hand-written identity and correction for matching files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManualMapping {
    pub new_title: String,

    /// Exact file name, with or without extension (case-insensitive).
    #[serde(default)]
    pub title: Option<String>,

    /// Substring of the file name (case-insensitive).
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub season: Option<u32>,

    #[serde(default)]
    pub episode_number: Option<u32>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub remove_frames: f64,

    #[serde(default)]
    pub patch_outro: bool,

    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,
}

fn default_speed_multiplier() -> f64 {
    1.0
}

impl ManualMapping {
    /// Whether this mapping applies to the file called `file_name`.
    pub fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let title_match = self
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .is_some_and(|t| {
                let t = t.to_lowercase();
                name == t || stem == t
            });
        let path_match = self
            .path
            .as_deref()
            .filter(|p| !p.is_empty())
            .is_some_and(|p| name.contains(&p.to_lowercase()));

        title_match || path_match
    }

    /// The timing correction part of this mapping.
    pub fn to_override(&self) -> ManualOverride {
        ManualOverride {
            remove_frames: self.remove_frames,
            patch_outro: self.patch_outro,
            speed_multiplier: self.speed_multiplier,
        }
    }
}

/// Moves an episode to another season/episode number.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenumberRule {
    pub from_season: u32,
    pub from_episode: u32,
    pub season: u32,
    pub episode: u32,
    #[serde(default)]
    pub title: Option<String>,
}
