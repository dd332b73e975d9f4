//! Audio codec selection for merged tracks.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Codecs a corrected track can be re-encoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// AAC (Advanced Audio Coding) - widely compatible
    #[default]
    Aac,
    /// AC-3 (Dolby Digital)
    Ac3,
    /// E-AC-3 (Dolby Digital Plus)
    Eac3,
    /// FLAC (Free Lossless Audio Codec)
    Flac,
    /// Opus
    Opus,
}

impl AudioCodec {
    /// Get the ffmpeg encoder name.
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Ac3 => "ac3",
            AudioCodec::Eac3 => "eac3",
            AudioCodec::Flac => "flac",
            AudioCodec::Opus => "libopus",
        }
    }

    /// Recommended bitrate, `None` for lossless codecs.
    pub fn default_bitrate(&self) -> Option<&'static str> {
        match self {
            AudioCodec::Aac => Some("256k"),
            AudioCodec::Ac3 => Some("640k"),
            AudioCodec::Eac3 => Some("768k"),
            AudioCodec::Flac => None,
            AudioCodec::Opus => Some("128k"),
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

impl FromStr for AudioCodec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aac" => Ok(AudioCodec::Aac),
            "ac3" => Ok(AudioCodec::Ac3),
            "eac3" => Ok(AudioCodec::Eac3),
            "flac" => Ok(AudioCodec::Flac),
            "opus" | "libopus" => Ok(AudioCodec::Opus),
            other => Err(Error::Unsupported(format!("audio codec '{other}'"))),
        }
    }
}

/// What happens to one audio track in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecChoice {
    /// Stream copy. Only valid for untouched tracks.
    Copy,
    /// Re-encode with the given codec.
    Encode(AudioCodec),
}

impl CodecChoice {
    pub fn is_copy(&self) -> bool {
        matches!(self, CodecChoice::Copy)
    }
}

impl fmt::Display for CodecChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecChoice::Copy => f.write_str("copy"),
            CodecChoice::Encode(codec) => codec.fmt(f),
        }
    }
}

impl Serialize for CodecChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
