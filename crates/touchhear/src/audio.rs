//! Audio trigger hand-off. Playback itself is an external concern.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions the playback side understands.
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "m4a"];

pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Request to start a region's audio.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub region_id: String,
    pub region_name: String,
    pub audio: PathBuf,
}

/// Receives triggers from the frame loop.
pub trait AudioSink: Send {
    fn play(&mut self, trigger: &Trigger);
}

/// Sink that only logs, for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAudioSink;

impl AudioSink for LogAudioSink {
    fn play(&mut self, trigger: &Trigger) {
        if !is_supported_audio(&trigger.audio) {
            warn!(
                "region {:?}: unsupported audio format {}",
                trigger.region_name,
                trigger.audio.display()
            );
            return;
        }
        info!(
            "play {} (region {:?})",
            trigger.audio.display(),
            trigger.region_name
        );
    }
}
