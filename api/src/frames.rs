//! Frame sampling
//!
//! Samples an uploaded video into still PNG frames at a fixed rate using ffmpeg,
//! then loads them back in playback order for ingredient detection.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::constants::FRAME_FILE_PREFIX;
use crate::error::{DecodeError, PipelineError};

const DEFAULT_FFMPEG_THREADS: usize = 1;

/// A still image sampled from the video
#[derive(Debug, Clone)]
pub struct Frame {
    /// 1-based, contiguous, ordered by playback time
    pub index: usize,
    pub timestamp_secs: f64,
    pub path: PathBuf,
    /// PNG bytes
    pub data: Vec<u8>,
}

/// Something that can decode a video into `frame_NNNN.png` files
#[async_trait]
pub trait FrameDecoder: Send + Sync {
    async fn extract(
        &self,
        input_path: &Path,
        fps: u32,
        output_dir: &Path,
    ) -> Result<(), PipelineError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    threads: usize,
}

impl FfmpegDecoder {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: if threads > 0 {
                threads
            } else {
                DEFAULT_FFMPEG_THREADS
            },
        }
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG_THREADS)
    }
}

#[async_trait]
impl FrameDecoder for FfmpegDecoder {
    async fn extract(
        &self,
        input_path: &Path,
        fps: u32,
        output_dir: &Path,
    ) -> Result<(), PipelineError> {
        let vf = format!("fps={}", fps);
        let pattern = output_dir.join(format!("{}%04d.png", FRAME_FILE_PREFIX));

        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .args(["-threads", &self.threads.to_string()])
            .arg("-i")
            .arg(input_path)
            .args(["-an", "-sn"])
            .args(["-vf", &vf])
            .arg("-y")
            .arg(&pattern)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let err = DecodeError {
                status: output.status.to_string(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            tracing::error!(
                "ffmpeg failed on {:?} ({}): stdout={:?} stderr={:?}",
                input_path,
                err.status,
                err.stdout,
                err.stderr
            );
            return Err(err.into());
        }

        Ok(())
    }
}

/// Decode `input_path` into `output_dir` and load the frames in playback order.
/// Any decoder failure aborts; a partial frame set is never returned.
pub async fn sample_frames(
    decoder: &dyn FrameDecoder,
    input_path: &Path,
    fps: u32,
    output_dir: &Path,
) -> Result<Vec<Frame>, PipelineError> {
    decoder.extract(input_path, fps, output_dir).await?;

    let frame_files = collect_frame_files(output_dir).await?;

    let mut frames = Vec::with_capacity(frame_files.len());
    for (i, path) in frame_files.into_iter().enumerate() {
        let index = i + 1;
        let data = tokio::fs::read(&path).await?;
        frames.push(Frame {
            index,
            timestamp_secs: index as f64 / fps as f64,
            path,
            data,
        });
    }

    tracing::info!("Sampled {} frames at {} fps from {:?}", frames.len(), fps, input_path);
    Ok(frames)
}

/// Frame files in `dir`, in playback order.
/// Sorted by the numeric counter, which outgrows its zero padding past 9999.
async fn collect_frame_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut frame_files: Vec<(u64, PathBuf)> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(number) = frame_number(&path) {
            frame_files.push((number, path));
        }
    }
    frame_files.sort_by_key(|(number, _)| *number);
    Ok(frame_files.into_iter().map(|(_, path)| path).collect())
}

/// "frame_0042.png" -> 42; anything else is not a frame
fn frame_number(path: &Path) -> Option<u64> {
    if path.extension()? != "png" {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(FRAME_FILE_PREFIX)?
        .parse()
        .ok()
}
