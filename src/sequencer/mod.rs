use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::audio_api::{DrumKit, Mixer};
use crate::shared::{clamp_tempo, BeatMode, STEPS_PER_MEASURE};

pub mod pattern;

#[derive(Clone, Debug)]
struct SequencerState {
    tempo: u16,
    mode: BeatMode,
    counter: u64,         // half-beats since the last mode change
    last_step: Option<u8>, // step most recently fired, for the display
}

/// Shared tempo/mode/step state. Cheap to clone; every clone sees the same
/// sequencer.
#[derive(Clone)]
pub struct BeatSequencer {
    state: Arc<Mutex<SequencerState>>,
}

impl BeatSequencer {
    pub fn new(tempo: i32, mode: BeatMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(SequencerState {
                tempo: clamp_tempo(tempo),
                mode,
                counter: 0,
                last_step: None,
            })),
        }
    }

    pub fn set_tempo(&self, bpm: i32) {
        self.state.lock().tempo = clamp_tempo(bpm);
    }

    // read-modify-write under one lock so a concurrent set_tempo isn't lost
    pub fn nudge_tempo(&self, delta: i32) -> u16 {
        let mut state = self.state.lock();
        state.tempo = clamp_tempo(state.tempo as i32 + delta);
        state.tempo
    }

    pub fn tempo(&self) -> u16 {
        self.state.lock().tempo
    }

    /// Always restarts the measure, even when `mode` is the current mode.
    pub fn set_mode(&self, mode: BeatMode) {
        let mut state = self.state.lock();
        state.mode = mode;
        state.counter = 0;
        state.last_step = None;
    }

    pub fn mode(&self) -> BeatMode {
        self.state.lock().mode
    }

    pub fn cycle_mode(&self) -> BeatMode {
        let mut state = self.state.lock();
        state.mode = state.mode.next();
        state.counter = 0;
        state.last_step = None;
        state.mode
    }

    // next half-beat to fire, within the measure
    #[cfg(test)]
    pub fn step(&self) -> u8 {
        (self.state.lock().counter % STEPS_PER_MEASURE as u64) as u8
    }

    pub fn last_step(&self) -> Option<u8> {
        self.state.lock().last_step
    }

    // (60 / tempo) / 2 seconds
    pub fn half_beat(&self) -> Duration {
        half_beat(self.tempo())
    }

    /// Fire the current step into `mixer` and move to the next one.
    pub fn tick(&self, mixer: &dyn Mixer, kit: &DrumKit) {
        // claim the step and advance in one go so a concurrent set_mode
        // can't be undone by the increment
        let (mode, counter) = {
            let mut state = self.state.lock();
            let claimed = (state.mode, state.counter);
            state.counter = state.counter.wrapping_add(1);
            state.last_step = Some((claimed.1 % STEPS_PER_MEASURE as u64) as u8);
            claimed
        };
        for &drum in pattern::hits(mode, counter) {
            kit.play(mixer, drum);
        }
    }

    pub fn spawn(&self, mixer: Arc<dyn Mixer>, kit: DrumKit) -> anyhow::Result<SequencerThread> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let sequencer = self.clone();
        let handle = std::thread::Builder::new()
            .name("beat-sequencer".into())
            .spawn(move || {
                log::info!("sequencer started at {} bpm, mode {}", sequencer.tempo(), sequencer.mode().label());
                loop {
                    sequencer.tick(mixer.as_ref(), &kit);
                    // tempo is re-read every half-beat
                    match stop_rx.recv_timeout(sequencer.half_beat()) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                log::info!("sequencer stopped");
            })?;
        Ok(SequencerThread {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

pub fn half_beat(tempo: u16) -> Duration {
    Duration::from_secs_f64(60.0 / tempo.max(1) as f64 / 2.0)
}

/// The running sequencer thread. Stopped and joined on drop.
pub struct SequencerThread {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SequencerThread {
    pub fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("sequencer thread panicked");
            }
        }
    }
}

impl Drop for SequencerThread {
    fn drop(&mut self) {
        self.stop();
    }
}
