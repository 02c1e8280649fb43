//! Per-invocation temporary storage.
//!
//! Holds the uploaded video and its sampled frames. The directory is removed
//! when the `Workspace` is dropped, so every exit path of a pipeline
//! invocation cleans up, including early returns on error.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "pantry_frames_";
const FRAMES_SUBDIR: &str = "frames";
const DEFAULT_VIDEO_EXTENSION: &str = "mp4";

pub struct Workspace {
    // Always Some until drop
    dir: Option<TempDir>,
    root: PathBuf,
    frames_dir: PathBuf,
}

impl Workspace {
    pub async fn create() -> Result<Self, std::io::Error> {
        let dir = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?;
        let root = dir.path().to_path_buf();
        let frames_dir = root.join(FRAMES_SUBDIR);
        tokio::fs::create_dir_all(&frames_dir).await?;
        Ok(Self {
            dir: Some(dir),
            root,
            frames_dir,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    /// Write the uploaded video. Only the original extension is reused.
    pub async fn write_video(
        &self,
        original_filename: &str,
        data: &[u8],
    ) -> Result<PathBuf, std::io::Error> {
        let input_path = self
            .root
            .join(format!("input.{}", video_extension(original_filename)));
        tokio::fs::write(&input_path, data).await?;
        Ok(input_path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => tracing::debug!("Removed workspace {:?}", self.root),
            Err(e) => tracing::warn!("Failed to remove workspace {:?}: {}", self.root, e),
        }
    }
}

/// Extension of an uploaded file name, if it is safe to put on disk
/// e.g. "../../pantry.MOV" -> "MOV", "clip" -> "mp4"
pub fn video_extension(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(DEFAULT_VIDEO_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension() {
        assert_eq!(video_extension("pantry.mov"), "mov");
        assert_eq!(video_extension("../../etc/pantry.MOV"), "MOV");
        assert_eq!(video_extension("clip"), "mp4");
        assert_eq!(video_extension("weird.m p4"), "mp4");
        assert_eq!(video_extension(""), "mp4");
    }

    #[tokio::test]
    async fn test_workspace_removed_on_drop() {
        let workspace = Workspace::create().await.unwrap();
        let root = workspace.path().to_path_buf();
        let input = workspace.write_video("fridge.webm", b"data").await.unwrap();

        assert!(workspace.frames_dir().is_dir());
        assert!(input.starts_with(&root));
        assert_eq!(input.file_name().unwrap(), "input.webm");

        drop(workspace);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_nested_frames() {
        let workspace = Workspace::create().await.unwrap();
        let root = workspace.path().to_path_buf();
        tokio::fs::write(workspace.frames_dir().join("frame_0001.png"), b"png")
            .await
            .unwrap();
        workspace.write_video("clip", b"data").await.unwrap();

        drop(workspace);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_drop_after_external_removal_does_not_panic() {
        let workspace = Workspace::create().await.unwrap();
        let root = workspace.path().to_path_buf();
        std::fs::remove_dir_all(&root).unwrap();

        // close() fails here; the failure is logged, not raised
        drop(workspace);
        assert!(!root.exists());
    }
}
