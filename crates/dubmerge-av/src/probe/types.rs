//! Media information types.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the media file.
    pub file_path: PathBuf,
    /// File size in bytes.
    pub file_size: u64,
    /// Container format (e.g., "matroska,webm").
    pub container: String,
    /// Container duration.
    pub duration: Option<Duration>,
    /// Video tracks in the file.
    pub video_tracks: Vec<VideoTrack>,
    /// Audio tracks in the file.
    pub audio_tracks: Vec<AudioTrack>,
}

/// Information about a video track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoTrack {
    /// Track index among video tracks.
    pub index: u32,
    /// Video codec (e.g., "h264", "vp9").
    pub codec: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate in FPS.
    pub frame_rate: Option<f64>,
    /// Stream duration, when the container reports one per stream.
    pub duration: Option<Duration>,
}

/// Information about an audio track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Track index among audio tracks.
    pub index: u32,
    /// Audio codec (e.g., "aac", "opus").
    pub codec: String,
    /// Number of channels.
    pub channels: u32,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Language code (e.g., "eng", "deu").
    pub language: Option<String>,
    /// Track title.
    pub title: Option<String>,
    /// Whether this is the default track.
    pub default: bool,
}

impl MediaInfo {
    /// Get the primary (first) video track.
    pub fn primary_video(&self) -> Option<&VideoTrack> {
        self.video_tracks.first()
    }

    /// Duration of the primary video stream, falling back to the container.
    pub fn video_duration(&self) -> Option<Duration> {
        self.primary_video()
            .and_then(|v| v.duration)
            .or(self.duration)
    }
}

/// The stream-level facts the synchronization engine works from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbedFacts {
    /// Frames per second of the primary video stream.
    pub frame_rate: f64,
    /// Duration of the primary video stream.
    pub duration: Duration,
    /// Whether the file has a video stream.
    pub has_video: bool,
    /// Whether the file has an audio stream.
    pub has_audio: bool,
}

impl ProbedFacts {
    /// Extract merge facts from probe output.
    ///
    /// Fails with [`Error::Unusable`] when the file has no video stream with a
    /// positive frame rate and duration, or no audio stream to contribute.
    pub fn from_media_info(info: &MediaInfo) -> Result<Self> {
        Self::from_media_info_at(&info.file_path, info)
    }

    fn from_media_info_at(path: &Path, info: &MediaInfo) -> Result<Self> {
        let video = info
            .primary_video()
            .ok_or_else(|| Error::unusable(path, "no video stream"))?;

        let frame_rate = video
            .frame_rate
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .ok_or_else(|| Error::unusable(path, "video stream has no frame rate"))?;

        let duration = info
            .video_duration()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| Error::unusable(path, "video stream has no duration"))?;

        if info.audio_tracks.is_empty() {
            return Err(Error::unusable(path, "no audio stream"));
        }

        Ok(Self {
            frame_rate,
            duration,
            has_video: true,
            has_audio: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(video: Option<VideoTrack>, audio: bool) -> MediaInfo {
        MediaInfo {
            file_path: PathBuf::from("/media/de/ep.mkv"),
            file_size: 0,
            container: "matroska,webm".into(),
            duration: Some(Duration::from_secs(1200)),
            video_tracks: video.into_iter().collect(),
            audio_tracks: if audio {
                vec![AudioTrack {
                    index: 0,
                    codec: "aac".into(),
                    channels: 2,
                    sample_rate: Some(48000),
                    language: None,
                    title: None,
                    default: true,
                }]
            } else {
                Vec::new()
            },
        }
    }

    fn video(fps: Option<f64>, duration: Option<Duration>) -> VideoTrack {
        VideoTrack {
            index: 0,
            codec: "h264".into(),
            width: 1920,
            height: 1080,
            frame_rate: fps,
            duration,
        }
    }

    #[test]
    fn prefers_stream_duration() {
        let info = info(Some(video(Some(25.0), Some(Duration::from_secs(400)))), true);
        let facts = ProbedFacts::from_media_info(&info).unwrap();
        assert_eq!(facts.duration, Duration::from_secs(400));
        assert_eq!(facts.frame_rate, 25.0);
    }

    #[test]
    fn falls_back_to_container_duration() {
        let info = info(Some(video(Some(25.0), None)), true);
        let facts = ProbedFacts::from_media_info(&info).unwrap();
        assert_eq!(facts.duration, Duration::from_secs(1200));
    }

    #[test]
    fn rejects_missing_streams() {
        assert!(ProbedFacts::from_media_info(&info(None, true)).is_err());
        assert!(ProbedFacts::from_media_info(&info(Some(video(Some(25.0), None)), false)).is_err());
        assert!(ProbedFacts::from_media_info(&info(Some(video(None, None)), true)).is_err());
    }
}
