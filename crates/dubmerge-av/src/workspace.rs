//! Staging area for merge output.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory next to a merge target.
///
/// ffmpeg writes into the workspace; [`finalize`](Self::finalize) renames the
/// result onto the target. The staging directory lives in the target's own
/// directory so the rename never crosses file systems, and a failed or
/// interrupted merge never leaves a partial file at the target path.
///
/// # Example
///
/// ```no_run
/// use dubmerge_av::Workspace;
///
/// let workspace = Workspace::for_target("/media/Show/Season 1/S01E01 - Pilot.mkv")?;
/// // run ffmpeg writing to workspace.output()
/// workspace.finalize()?;
/// # Ok::<(), dubmerge_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
    output_path: PathBuf,
    target_path: PathBuf,
}

impl Workspace {
    /// Create a workspace for producing `target`.
    pub fn for_target<P: AsRef<Path>>(target: P) -> Result<Self> {
        let target = target.as_ref();
        let file_name = target
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("invalid target path: {}", target.display())))?;
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let temp_dir = tempfile::Builder::new()
            .prefix(".dubmerge-")
            .tempdir_in(parent)
            .map_err(|e| Error::Workspace(format!("failed to create staging directory in {}: {e}", parent.display())))?;
        let output_path = temp_dir.path().join(file_name);

        Ok(Self {
            temp_dir,
            output_path,
            target_path: target.to_path_buf(),
        })
    }

    /// Where the transcoder writes.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Where the result ends up.
    pub fn target(&self) -> &Path {
        &self.target_path
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Move the output onto the target. Refuses to replace an existing file.
    pub fn finalize(self) -> Result<PathBuf> {
        if !self.output_path.exists() {
            return Err(Error::Workspace(format!(
                "Output file does not exist: {:?}",
                self.output_path
            )));
        }
        if self.target_path.exists() {
            return Err(Error::Workspace(format!(
                "Target already exists: {:?}",
                self.target_path
            )));
        }

        std::fs::rename(&self.output_path, &self.target_path)
            .map_err(|e| Error::Workspace(format!("Failed to move output to target: {e}")))?;

        Ok(self.target_path)
    }

    /// Clean up without finalizing (discard output).
    pub fn cleanup(self) {
        drop(self.temp_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_next_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("S01E01 - Pilot.mkv");
        let workspace = Workspace::for_target(&target).unwrap();

        assert!(workspace.temp_dir().starts_with(dir.path()));
        assert_eq!(workspace.output().file_name(), target.file_name());
        assert_eq!(workspace.target(), target);
    }

    #[test]
    fn finalize_moves_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.mkv");
        let workspace = Workspace::for_target(&target).unwrap();
        std::fs::write(workspace.output(), b"merged").unwrap();
        let staging = workspace.temp_dir().to_path_buf();

        let done = workspace.finalize().unwrap();
        assert_eq!(done, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"merged");
        assert!(!staging.exists());
    }

    #[test]
    fn finalize_without_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::for_target(dir.path().join("out.mkv")).unwrap();
        assert!(matches!(workspace.finalize(), Err(Error::Workspace(_))));
    }

    #[test]
    fn cleanup_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.mkv");
        let workspace = Workspace::for_target(&target).unwrap();
        std::fs::write(workspace.output(), b"partial").unwrap();
        workspace.cleanup();

        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
