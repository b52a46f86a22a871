use std::sync::Arc;

use crate::shared::Drum;

pub use crate::audio::WaveformAsset;

// What every producer (sequencer, remote commands, local controls) sees of the
// mixing engine. None of these block on I/O; they only hold the pool lock briefly.
pub trait Mixer: Send + Sync {
    // Fire-and-forget: if every voice slot is busy the sound is dropped
    fn enqueue(&self, asset: &Arc<WaveformAsset>);

    // Clamped to [0, 100]
    fn set_volume(&self, volume: i32);

    fn volume(&self) -> u8;
}

// The three percussion sounds, loaded once at startup and shared read-only
#[derive(Clone, Debug)]
pub struct DrumKit {
    pub kick: Arc<WaveformAsset>,
    pub hihat: Arc<WaveformAsset>,
    pub snare: Arc<WaveformAsset>,
}

impl DrumKit {
    pub fn new(kick: WaveformAsset, hihat: WaveformAsset, snare: WaveformAsset) -> Self {
        Self {
            kick: Arc::new(kick),
            hihat: Arc::new(hihat),
            snare: Arc::new(snare),
        }
    }

    pub fn get(&self, drum: Drum) -> &Arc<WaveformAsset> {
        match drum {
            Drum::Kick => &self.kick,
            Drum::HiHat => &self.hihat,
            Drum::Snare => &self.snare,
        }
    }

    pub fn play(&self, mixer: &dyn Mixer, drum: Drum) {
        mixer.enqueue(self.get(drum));
    }
}
