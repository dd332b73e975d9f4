//! Error types for dubmerge-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing files or running external tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool failed to execute.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// The specified file was not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The file was readable but lacks the streams a merge needs.
    #[error("unusable media file {}: {reason}", path.display())]
    Unusable { path: PathBuf, reason: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unsupported codec or option.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Workspace error.
    #[error("workspace error: {0}")]
    Workspace(String),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create an unusable media error.
    pub fn unusable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Unusable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Reasons the synchronization engine refuses to produce a merge plan.
///
/// Every variant aborts the current episode group only.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Fewer than two usable sources.
    #[error("not enough sources to merge: found {found}, need at least 2")]
    InsufficientSources { found: usize },

    /// The timing difference is neither within tolerance nor an intro offset.
    #[error(
        "{} and {} are out of sync by {frame_delta:.0} frames (about {seconds:.2} seconds)",
        reference.display(),
        item.display()
    )]
    UnsynchronizableTiming {
        reference: PathBuf,
        item: PathBuf,
        frame_delta: f64,
        seconds: f64,
    },

    /// An intro offset was detected but fixing it would touch the reference.
    #[error("cannot correct automatically, edit {} manually: {reason}", file.display())]
    UnsupportedCorrection { file: PathBuf, reason: String },

    /// A correction left an item with a negative output length.
    #[error("correction for {} leaves {output_frames:.0} output frames", path.display())]
    InvalidCorrection { path: PathBuf, output_frames: f64 },

    /// A manual override carries values that cannot be applied.
    #[error("invalid manual override for {}: {reason}", path.display())]
    InvalidOverride { path: PathBuf, reason: String },

    /// An item reached plan emission without a resolved language.
    #[error("no language resolved for {}", path.display())]
    MissingLanguage { path: PathBuf },
}
