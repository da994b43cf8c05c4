//! services/transcription.rs
//! Speech-to-text collaborator contract plus the checks around it.
//! The recognizer itself (e.g. a Whisper server) lives behind [`Transcriber`].

use serde::{Deserialize, Serialize};

use crate::config::ContentConfig;

pub const SUPPORTED_FORMATS: &[&str] = &["wav", "mp3", "m4a", "ogg", "flac", "aac", "wma"];

const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;
const MIN_SAMPLE_RATE: u32 = 8000;
const DEFAULT_NO_SPEECH_PROB: f64 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("transcriber unavailable: {0}")]
    Unavailable(String),
    #[error("transcription failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub no_speech_prob: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn confidence(&self) -> f64 {
        transcription_confidence(&self.segments)
    }
}

pub trait Transcriber {
    /// `language_hint` is an ISO code; `None` or `"auto"` lets the recognizer detect it.
    fn transcribe(&self, audio: &[u8], language_hint: Option<&str>) -> Result<Transcript, TranscriptionError>;
}

/// Duration-weighted mean of `1 - no_speech_prob`; 0.5 with no usable duration.
pub fn transcription_confidence(segments: &[Segment]) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for seg in segments {
        let duration = seg.end - seg.start;
        let confidence = 1.0 - seg.no_speech_prob.unwrap_or(DEFAULT_NO_SPEECH_PROB);
        weighted += confidence * duration;
        total += duration;
    }
    if total > 0.0 { weighted / total } else { 0.5 }
}

/// What the caller knows about an upload before transcribing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub format: String,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioValidation {
    pub is_valid: bool,
    pub too_long: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

pub fn validate_audio(info: &AudioInfo, limits: &ContentConfig) -> AudioValidation {
    let mut v = AudioValidation::default();
    let format = info.format.trim().trim_start_matches('.').to_ascii_lowercase();
    if !SUPPORTED_FORMATS.contains(&format.as_str()) {
        v.errors.push(format!("Unsupported audio format: {}", info.format));
    }
    if info.duration_secs > limits.max_audio_secs {
        v.too_long = true;
        v.warnings.push(format!(
            "Audio duration ({:.1}s) exceeds maximum ({}s). Will be truncated.",
            info.duration_secs, limits.max_audio_secs
        ));
    }
    if info.duration_secs < 1.0 {
        v.warnings.push("Audio is very short (< 1 second)".to_string());
    }
    if info.sample_rate < MIN_SAMPLE_RATE {
        v.warnings.push("Low sample rate may affect transcription quality".to_string());
    }
    if info.size_bytes > MAX_UPLOAD_BYTES {
        v.errors.push("Audio file too large (> 25MB)".to_string());
    }
    v.is_valid = v.errors.is_empty();
    v
}

/// Rough wall-clock estimate for a recognizer model size.
pub fn estimate_transcription_secs(duration_secs: f64, model: &str) -> f64 {
    let speed = match model {
        "tiny" => 8.0,
        "base" => 6.0,
        "small" => 4.0,
        "medium" => 2.0,
        "large" => 1.0,
        _ => 4.0,
    };
    (duration_secs / speed * 1.5).max(5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, nsp: Option<f64>) -> Segment {
        Segment {
            start,
            end,
            text: String::new(),
            no_speech_prob: nsp,
        }
    }

    #[test]
    fn confidence_is_duration_weighted() {
        let segs = [seg(0.0, 3.0, Some(0.0)), seg(3.0, 4.0, Some(1.0))];
        assert!((transcription_confidence(&segs) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn confidence_defaults_to_half() {
        assert_eq!(transcription_confidence(&[]), 0.5);
        assert_eq!(transcription_confidence(&[seg(2.0, 2.0, Some(0.1))]), 0.5);
        assert!((transcription_confidence(&[seg(0.0, 1.0, None)]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn long_audio_is_flagged_not_rejected() {
        let info = AudioInfo {
            format: "WAV".into(),
            duration_secs: 301.0,
            sample_rate: 16_000,
            size_bytes: 1024,
        };
        let v = validate_audio(&info, &ContentConfig::default());
        assert!(v.too_long);
        assert!(v.is_valid);
    }

    #[test]
    fn unknown_format_and_oversize_are_errors() {
        let info = AudioInfo {
            format: "amr".into(),
            duration_secs: 10.0,
            sample_rate: 4_000,
            size_bytes: 30 * 1024 * 1024,
        };
        let v = validate_audio(&info, &ContentConfig::default());
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 2);
        assert_eq!(v.warnings.len(), 1);
    }

    #[test]
    fn estimate_has_floor() {
        assert_eq!(estimate_transcription_secs(1.0, "tiny"), 5.0);
        assert!((estimate_transcription_secs(60.0, "medium") - 45.0).abs() < 1e-9);
    }
}
