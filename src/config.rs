// beatbox.json, read once at startup. Every key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::audio::EngineSettings;
use crate::controls::{AirDrumSettings, ArbitrationSettings};
use crate::shared::BeatMode;

pub const DEFAULT_CONFIG_FILE: &str = "beatbox.json";
pub const DEFAULT_LOG_FILE: &str = "beatbox.log";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assets: AssetPaths,
    pub audio: AudioConfig,
    pub sequencer: SequencerConfig,
    pub controls: ControlsConfig,
    pub remote: RemoteConfig,
    pub stats_period_ms: u64,
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub kick: PathBuf,
    pub snare: PathBuf,
    pub hihat: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            kick: PathBuf::from("assets/kick.wav"),
            snare: PathBuf::from("assets/snare.wav"),
            hihat: PathBuf::from("assets/hihat.wav"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub sample_rate: u32,
    pub period_frames: usize,
    pub voices: usize,
    pub default_volume: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            enabled: engine.enabled,
            sample_rate: engine.sample_rate,
            period_frames: engine.period_frames,
            voices: engine.voices,
            default_volume: engine.default_volume,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub tempo: i32,
    pub mode: BeatMode,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self { tempo: 120, mode: BeatMode::Rock }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub poll_period_ms: u64,
    pub lockout_ms: u64,
    pub debounce_polls: u32,
    pub volume_step: i32,
    pub air_drum_threshold: u32,
    pub air_drum_debounce_polls: u32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        let air_drum = AirDrumSettings::default();
        Self {
            poll_period_ms: 10,
            lockout_ms: 2000,
            debounce_polls: 10,
            volume_step: 5,
            air_drum_threshold: air_drum.threshold,
            air_drum_debounce_polls: air_drum.debounce_polls,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub bind: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:12345".to_string() }
    }
}

impl Config {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            enabled: self.audio.enabled,
            sample_rate: self.audio.sample_rate,
            period_frames: self.audio.period_frames,
            voices: self.audio.voices.max(1),
            default_volume: self.audio.default_volume,
        }
    }

    pub fn arbitration_settings(&self) -> ArbitrationSettings {
        ArbitrationSettings {
            lockout: Duration::from_millis(self.controls.lockout_ms),
            debounce_polls: self.controls.debounce_polls,
            volume_step: self.controls.volume_step,
        }
    }

    pub fn air_drum_settings(&self) -> AirDrumSettings {
        AirDrumSettings {
            threshold: self.controls.air_drum_threshold,
            debounce_polls: self.controls.air_drum_debounce_polls,
        }
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.controls.poll_period_ms.max(1))
    }

    pub fn stats_period(&self) -> Duration {
        Duration::from_millis(self.stats_period_ms.max(1))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            audio: AudioConfig::default(),
            sequencer: SequencerConfig::default(),
            controls: ControlsConfig::default(),
            remote: RemoteConfig::default(),
            stats_period_ms: 1000,
            log_file: None,
        }
    }
}

/// A missing file means defaults; a file that exists but doesn't parse is an error.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}
