// Fixed voice slots. Producers only claim free slots, only the render thread
// frees them, and a commit re-checks each slot's generation before touching it.

use std::sync::Arc;

use super::waveform::WaveformAsset;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    pub index: usize,
    pub generation: u64,
}

#[derive(Clone, Debug, Default)]
struct VoiceSlot {
    asset: Option<Arc<WaveformAsset>>,
    cursor: usize, // always < asset.sample_count() while asset is Some
    generation: u64,
}

#[derive(Clone, Debug)]
pub struct ActiveVoice {
    pub handle: SlotHandle,
    pub asset: Arc<WaveformAsset>,
    pub cursor: usize,
}

impl ActiveVoice {
    pub fn remaining(&self) -> &[i16] {
        &self.asset.samples()[self.cursor..]
    }
}

// copied out under the lock at the start of a render cycle
#[derive(Clone, Debug, Default)]
pub struct PoolSnapshot {
    voices: Vec<ActiveVoice>,
    gain: f64,
}

impl PoolSnapshot {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { voices: Vec::with_capacity(capacity), gain: 0.0 }
    }

    pub fn voices(&self) -> &[ActiveVoice] {
        &self.voices
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceProgress {
    pub handle: SlotHandle,
    pub finished: bool,
}

pub struct VoicePool {
    slots: Vec<VoiceSlot>,
}

impl VoicePool {
    pub fn new(size: usize) -> Self {
        Self { slots: vec![VoiceSlot::default(); size] }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active(&self) -> usize {
        self.slots.iter().filter(|s| s.asset.is_some()).count()
    }

    // first free slot wins; None when the pool is full
    pub fn claim(&mut self, asset: &Arc<WaveformAsset>) -> Option<SlotHandle> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.asset.is_none())?;
        slot.generation += 1;
        slot.asset = Some(Arc::clone(asset));
        slot.cursor = 0;
        Some(SlotHandle { index, generation: slot.generation })
    }

    #[cfg(test)]
    pub fn remaining(&self, handle: SlotHandle) -> Option<usize> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.asset.as_ref().map(|a| a.sample_count() - slot.cursor)
    }

    pub fn snapshot_into(&self, out: &mut PoolSnapshot, volume: u8) {
        out.voices.clear();
        out.gain = volume as f64 / 100.0;
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(asset) = &slot.asset {
                out.voices.push(ActiveVoice {
                    handle: SlotHandle { index, generation: slot.generation },
                    asset: Arc::clone(asset),
                    cursor: slot.cursor,
                });
            }
        }
    }

    // Finished voices are freed, the rest move forward by `advanced`.
    // A slot whose generation changed since the snapshot is left alone.
    pub fn commit(&mut self, progress: &[VoiceProgress], advanced: usize) {
        for p in progress {
            let Some(slot) = self.slots.get_mut(p.handle.index) else {
                continue;
            };
            if slot.generation != p.handle.generation {
                continue;
            }
            let Some(asset) = &slot.asset else {
                continue;
            };
            let cursor = slot.cursor + advanced;
            if p.finished || cursor >= asset.sample_count() {
                slot.asset = None;
                slot.cursor = 0;
            } else {
                slot.cursor = cursor;
            }
        }
    }

    #[cfg(test)]
    pub fn release(&mut self, handle: SlotHandle) {
        if let Some(slot) = self.slots.get_mut(handle.index) {
            if slot.generation == handle.generation {
                slot.asset = None;
                slot.cursor = 0;
            }
        }
    }
}
