//! Running merge plans through the ffmpeg CLI.

use crate::merge::{CodecChoice, MergePlan};
use crate::{Error, Result};
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Default transcode timeout: 6 hours.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);

/// How often a running ffmpeg is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Bytes of stderr kept for error messages.
const STDERR_TAIL: usize = 4096;

/// Executes merge plans.
///
/// Implementations block until the output file is complete.
pub trait Transcoder: Send + Sync {
    fn transcode(&self, plan: &MergePlan) -> Result<()>;
}

/// Render `plan` as ffmpeg arguments, without the program name.
pub fn ffmpeg_args(plan: &MergePlan) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
        .into_iter()
        .map(String::from)
        .collect();

    for input in &plan.inputs {
        if let Some(seek) = input.seek {
            args.push("-ss".into());
            args.push(format_secs(seek));
        }
        if let Some(end) = input.end_seek {
            args.push("-to".into());
            args.push(format_secs(end));
        }
        args.push("-i".into());
        args.push(input.path.to_string_lossy().into_owned());
    }

    if !plan.filter_graph.is_empty() {
        args.push("-filter_complex".into());
        args.push(plan.filter_graph.clone());
    }

    args.push("-map".into());
    args.push(plan.video_map.to_string());
    for track in &plan.audio_tracks {
        args.push("-map".into());
        args.push(track.map.to_string());
    }

    args.push("-c:v".into());
    args.push("copy".into());

    for track in &plan.audio_tracks {
        let n = track.index;
        args.push(format!("-c:a:{n}"));
        args.push(track.codec.to_string());
        if let CodecChoice::Encode(codec) = track.codec {
            if let Some(bitrate) = codec.default_bitrate() {
                args.push(format!("-b:a:{n}"));
                args.push(bitrate.into());
            }
        }
        if track.clear_default {
            args.push(format!("-disposition:a:{n}"));
            args.push("-default".into());
        }
        args.push(format!("-metadata:s:a:{n}"));
        args.push(format!("title={}", track.title));
        args.push(format!("-metadata:s:a:{n}"));
        args.push(format!("language={}", track.language));
    }

    args.push(plan.output.to_string_lossy().into_owned());
    args
}

fn format_secs(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}

/// A [`Transcoder`] spawning the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the maximum execution time.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ffmpeg_path(&self) -> &std::path::Path {
        &self.ffmpeg_path
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new(PathBuf::from("ffmpeg"))
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, plan: &MergePlan) -> Result<()> {
        let args = ffmpeg_args(plan);

        #[cfg(feature = "tracing")]
        tracing::debug!("Running {:?} {}", self.ffmpeg_path, args.join(" "));

        // ffmpeg can be chatty; a file never blocks the child like a full pipe would.
        let mut stderr_file = tempfile::tempfile()?;

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file.try_clone()?))
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffmpeg")
                } else {
                    Error::Io(e)
                }
            })?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::tool_failed(
                    "ffmpeg",
                    format!("timed out after {}s", self.timeout.as_secs()),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            let stderr = read_tail(&mut stderr_file)?;
            return Err(Error::tool_failed(
                "ffmpeg",
                format!("exited with {}: {}", status, stderr.trim()),
            ));
        }

        if !plan.output.exists() {
            return Err(Error::tool_failed(
                "ffmpeg",
                format!("no output written to {}", plan.output.display()),
            ));
        }

        Ok(())
    }
}

fn read_tail(file: &mut std::fs::File) -> Result<String> {
    let len = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(len.saturating_sub(STDERR_TAIL as u64)))?;
    let mut buf = Vec::with_capacity(STDERR_TAIL);
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
