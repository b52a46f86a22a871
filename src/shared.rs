// Types shared by every layer of the box:
//
//   - the sequencer modes and drum names used by the remote protocol
//   - the events the front panel resolves key presses into
//   - the status snapshot the panel (or the headless reporter) renders
//
// Numeric codes here are part of the remote protocol, don't renumber them.

use serde::{Deserialize, Serialize};

pub const MAX_VOLUME: u8 = 100;
pub const MIN_TEMPO: u16 = 40;
pub const MAX_TEMPO: u16 = 300;
pub const STEPS_PER_MEASURE: usize = 8; // half-beats in a 4/4 measure

pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(0, MAX_VOLUME as i32) as u8
}

pub fn clamp_tempo(bpm: i32) -> u16 {
    bpm.clamp(MIN_TEMPO as i32, MAX_TEMPO as i32) as u16
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatMode {
    #[serde(alias = "silent")]
    None,
    #[default]
    Rock,
    Custom,
}

impl BeatMode {
    pub fn code(self) -> u8 {
        match self {
            BeatMode::None => 0,
            BeatMode::Rock => 1,
            BeatMode::Custom => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(BeatMode::None),
            1 => Some(BeatMode::Rock),
            2 => Some(BeatMode::Custom),
            _ => None,
        }
    }

    // what the mode button does: none -> rock -> custom -> none
    pub fn next(self) -> Self {
        match self {
            BeatMode::None => BeatMode::Rock,
            BeatMode::Rock => BeatMode::Custom,
            BeatMode::Custom => BeatMode::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BeatMode::None => "NONE",
            BeatMode::Rock => "ROCK",
            BeatMode::Custom => "CUSTOM",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Drum {
    Kick,
    HiHat,
    Snare,
}

impl Drum {
    // `play N` ids: 0 = base drum, 1 = hi-hat, 2 = snare
    pub fn from_play_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Drum::Kick),
            1 => Some(Drum::HiHat),
            2 => Some(Drum::Snare),
            _ => None,
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Drum::Kick => "K",
            Drum::HiHat => "H",
            Drum::Snare => "S",
        }
    }
}

// Level signal from the local analog control (the joystick on the board,
// the arrow keys on a laptop).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    Down,
    #[default]
    Center,
    Up,
}

impl Direction {
    pub fn sign(self) -> i32 {
        match self {
            Direction::Down => -1,
            Direction::Center => 0,
            Direction::Up => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlEvent {
    CycleMode,      // mode button press (edge)
    Trigger(Drum),  // drum pad hit
    NudgeTempo(i32),
    Quit,
}

#[derive(Clone, Debug)]
pub struct StatusView {
    pub mode: BeatMode,
    pub tempo: u16,
    pub volume: u8,
    pub step: Option<u8>, // half-beat last fired, 0..8
    pub active_voices: usize,
    pub voice_capacity: usize,
    pub silent: bool, // engine is in degraded silent mode
    pub locked_out: bool, // local volume control is locked out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_volume(-20), 0);
        assert_eq!(clamp_volume(55), 55);
        assert_eq!(clamp_volume(1000), 100);
        assert_eq!(clamp_tempo(0), MIN_TEMPO);
        assert_eq!(clamp_tempo(120), 120);
        assert_eq!(clamp_tempo(i32::MAX), MAX_TEMPO);
    }

    #[test]
    fn test_mode_codes_and_cycle() {
        for code in 0..3 {
            let mode = BeatMode::from_code(code).unwrap();
            assert_eq!(mode.code() as i64, code);
        }
        assert_eq!(BeatMode::from_code(3), None);
        assert_eq!(BeatMode::from_code(-1), None);

        let mut mode = BeatMode::None;
        let seen: Vec<_> = (0..4)
            .map(|_| {
                mode = mode.next();
                mode
            })
            .collect();
        assert_eq!(seen, vec![BeatMode::Rock, BeatMode::Custom, BeatMode::None, BeatMode::Rock]);
    }

    #[test]
    fn test_play_ids() {
        assert_eq!(Drum::from_play_id(0), Some(Drum::Kick));
        assert_eq!(Drum::from_play_id(1), Some(Drum::HiHat));
        assert_eq!(Drum::from_play_id(2), Some(Drum::Snare));
        assert_eq!(Drum::from_play_id(3), None);
    }

    #[test]
    fn test_mode_serde_names() {
        let mode: BeatMode = serde_json::from_str("\"custom\"").unwrap();
        assert_eq!(mode, BeatMode::Custom);
        let mode: BeatMode = serde_json::from_str("\"silent\"").unwrap();
        assert_eq!(mode, BeatMode::None);
        assert_eq!(serde_json::to_string(&BeatMode::Rock).unwrap(), "\"rock\"");
    }
}
