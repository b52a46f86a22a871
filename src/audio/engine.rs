use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio_api::Mixer;
use crate::shared::clamp_volume;

use super::voice::{PoolSnapshot, SlotHandle, VoicePool, VoiceProgress};
use super::waveform::WaveformAsset;

// Everything guarded by the one mixer lock
struct MixerState {
    pool: VoicePool,
    volume: u8,
    silent: bool, // degraded mode, no renderer is draining the pool
}

// Cloneable handle onto the voice pool and master volume. Producers on any
// thread hold one of these; the render thread holds another.
#[derive(Clone)]
pub struct VoiceMixer {
    state: Arc<Mutex<MixerState>>,
}

impl VoiceMixer {
    pub fn new(voices: usize, volume: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(MixerState {
                pool: VoicePool::new(voices),
                volume: clamp_volume(volume as i32),
                silent: false,
            })),
        }
    }

    pub(crate) fn set_silent(&self, silent: bool) {
        self.state.lock().silent = silent;
    }

    pub fn is_silent(&self) -> bool {
        self.state.lock().silent
    }

    /// Claim a voice for `asset`. `None` when the sound was dropped.
    pub fn try_enqueue(&self, asset: &Arc<WaveformAsset>) -> Option<SlotHandle> {
        if asset.is_empty() {
            log::warn!("ignoring enqueue of an empty waveform");
            return None;
        }
        let mut state = self.state.lock();
        if state.silent {
            return None;
        }
        let handle = state.pool.claim(asset);
        let capacity = state.pool.capacity();
        drop(state);

        if handle.is_none() {
            log::warn!("no free voice slot ({capacity} in use), skipping sound");
        }
        handle
    }

    pub fn active_voices(&self) -> usize {
        self.state.lock().pool.active()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().pool.capacity()
    }

    #[cfg(test)]
    pub fn remaining(&self, handle: SlotHandle) -> Option<usize> {
        self.state.lock().pool.remaining(handle)
    }

    fn snapshot_into(&self, out: &mut PoolSnapshot) {
        let state = self.state.lock();
        state.pool.snapshot_into(out, state.volume);
    }

    fn commit(&self, progress: &[VoiceProgress], advanced: usize) {
        self.state.lock().pool.commit(progress, advanced);
    }

    #[cfg(test)]
    pub(crate) fn release(&self, handle: SlotHandle) {
        self.state.lock().pool.release(handle);
    }
}

impl Mixer for VoiceMixer {
    fn enqueue(&self, asset: &Arc<WaveformAsset>) {
        let _ = self.try_enqueue(asset);
    }

    fn set_volume(&self, volume: i32) {
        self.state.lock().volume = clamp_volume(volume);
    }

    fn volume(&self) -> u8 {
        self.state.lock().volume
    }
}

// Add one volume-scaled sample on top of what's already in the buffer,
// clipping to the i16 range instead of wrapping
#[inline]
pub fn mix_sample(acc: i16, sample: i16, gain: f64) -> i16 {
    let scaled = (sample as f64 * gain) as i32; // truncates toward zero
    (acc as i32 + scaled).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

// Produces one period of output per call. Owned by the render thread.
pub struct Renderer {
    mixer: VoiceMixer,
    buffer: Vec<i16>,
    snapshot: PoolSnapshot,
    progress: Vec<VoiceProgress>,
}

impl Renderer {
    pub fn new(mixer: VoiceMixer, period_frames: usize) -> Self {
        let voices = mixer.capacity();
        Self {
            mixer,
            buffer: vec![0; period_frames.max(1)],
            snapshot: PoolSnapshot::with_capacity(voices),
            progress: Vec::with_capacity(voices),
        }
    }

    pub fn period_frames(&self) -> usize {
        self.buffer.len()
    }

    pub fn render(&mut self) -> &[i16] {
        self.buffer.fill(0);

        // hold the lock only long enough to copy the slot table
        self.mixer.snapshot_into(&mut self.snapshot);

        let len = self.buffer.len();
        let gain = self.snapshot.gain();
        self.progress.clear();
        for voice in self.snapshot.voices() {
            let remaining = voice.remaining();
            for (out, &sample) in self.buffer.iter_mut().zip(remaining) {
                *out = mix_sample(*out, sample, gain);
            }
            self.progress.push(VoiceProgress {
                handle: voice.handle,
                finished: remaining.len() <= len,
            });
        }

        self.mixer.commit(&self.progress, len);
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(samples: Vec<i16>) -> Arc<WaveformAsset> {
        Arc::new(WaveformAsset::new(samples))
    }

    #[test]
    fn test_set_volume_clamps() {
        let mixer = VoiceMixer::new(4, 80);
        for (input, expected) in [(-5, 0), (0, 0), (42, 42), (100, 100), (101, 100), (i32::MIN, 0)] {
            mixer.set_volume(input);
            assert_eq!(mixer.volume(), expected, "set_volume({input})");
        }
    }

    #[test]
    fn test_pool_never_exceeds_capacity() {
        let mixer = VoiceMixer::new(3, 100);
        let a = asset(vec![1; 100]);
        let claimed: Vec<_> = (0..10).map(|_| mixer.try_enqueue(&a)).collect();
        assert_eq!(claimed.iter().filter(|h| h.is_some()).count(), 3);
        assert!(claimed[3..].iter().all(Option::is_none));
        assert_eq!(mixer.active_voices(), 3);
    }

    #[test]
    fn test_silent_mixer_ignores_enqueue() {
        let mixer = VoiceMixer::new(3, 100);
        mixer.set_silent(true);
        mixer.enqueue(&asset(vec![1; 10]));
        assert_eq!(mixer.active_voices(), 0);
        mixer.set_volume(30);
        assert_eq!(mixer.volume(), 30);
    }

    #[test]
    fn test_empty_asset_is_ignored() {
        let mixer = VoiceMixer::new(3, 100);
        assert_eq!(mixer.try_enqueue(&asset(vec![])), None);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_mix_sample_saturates() {
        assert_eq!(mix_sample(i16::MAX, i16::MAX, 1.0), i16::MAX);
        assert_eq!(mix_sample(i16::MIN, i16::MIN, 1.0), i16::MIN);
        assert_eq!(mix_sample(30_000, 10_000, 1.0), i16::MAX);
        assert_eq!(mix_sample(-30_000, -10_000, 1.0), i16::MIN);
        assert_eq!(mix_sample(100, 101, 0.5), 150); // 50.5 truncated
        assert_eq!(mix_sample(0, -101, 0.5), -50);
    }

    #[test]
    fn test_two_full_scale_voices_clip() {
        let mixer = VoiceMixer::new(2, 100);
        mixer.enqueue(&asset(vec![i16::MAX; 4]));
        mixer.enqueue(&asset(vec![i16::MAX; 4]));
        let mut renderer = Renderer::new(mixer.clone(), 4);
        assert_eq!(renderer.render(), &[i16::MAX; 4]);

        mixer.enqueue(&asset(vec![i16::MIN; 4]));
        mixer.enqueue(&asset(vec![i16::MIN; 4]));
        assert_eq!(renderer.render(), &[i16::MIN; 4]);
    }

    #[test]
    fn test_volume_scales_output() {
        let mixer = VoiceMixer::new(2, 50);
        mixer.enqueue(&asset(vec![1000, -1000, 3]));
        let mut renderer = Renderer::new(mixer.clone(), 4);
        assert_eq!(renderer.render(), &[500, -500, 1, 0]);
    }

    #[test]
    fn test_voice_contributes_exactly_its_samples() {
        let mixer = VoiceMixer::new(4, 100);
        let samples: Vec<i16> = (1..=10).collect();
        let handle = mixer.try_enqueue(&asset(samples.clone())).unwrap();
        let mut renderer = Renderer::new(mixer.clone(), 4);

        let mut out = Vec::new();
        for _ in 0..4 {
            out.extend_from_slice(renderer.render());
        }
        assert_eq!(&out[..10], samples.as_slice());
        assert!(out[10..].iter().all(|&s| s == 0));
        assert_eq!(mixer.remaining(handle), None);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_voice_cursor_advances_per_cycle() {
        let mixer = VoiceMixer::new(1, 100);
        let handle = mixer.try_enqueue(&asset(vec![7; 10])).unwrap();
        let mut renderer = Renderer::new(mixer.clone(), 4);
        renderer.render();
        assert_eq!(mixer.remaining(handle), Some(6));
        renderer.render();
        assert_eq!(mixer.remaining(handle), Some(2));
        renderer.render();
        assert_eq!(mixer.remaining(handle), None);
    }

    #[test]
    fn test_pool_of_two_scenario() {
        let mixer = VoiceMixer::new(2, 100);
        let a = asset(vec![10, 20, 30, 40]);
        let b = asset(vec![1, 2, 3, 4]);

        let ha = mixer.try_enqueue(&a).unwrap();
        let hb = mixer.try_enqueue(&b).unwrap();
        assert_eq!(mixer.try_enqueue(&a), None);
        assert_eq!(mixer.active_voices(), 2);

        let mut renderer = Renderer::new(mixer.clone(), 4);
        assert_eq!(renderer.render(), &[11, 22, 33, 44]);

        assert_eq!(mixer.remaining(ha), None);
        assert_eq!(mixer.remaining(hb), None);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_enqueue_after_render_reuses_freed_slot() {
        let mixer = VoiceMixer::new(1, 100);
        let a = asset(vec![5; 4]);
        mixer.enqueue(&a);
        let mut renderer = Renderer::new(mixer.clone(), 4);
        renderer.render();
        let handle = mixer.try_enqueue(&a).unwrap();
        assert_eq!(handle.index, 0);
        assert_eq!(mixer.remaining(handle), Some(4));
    }

    #[test]
    fn test_reclaimed_slot_starts_from_zero() {
        let mixer = VoiceMixer::new(1, 100);
        let a = asset(vec![5; 100]);
        let stale = mixer.try_enqueue(&a).unwrap();
        let mut renderer = Renderer::new(mixer.clone(), 4);
        renderer.render();

        // free and reclaim between two cycles; the new voice starts from 0
        mixer.release(stale);
        let fresh = mixer.try_enqueue(&a).unwrap();
        assert_eq!(mixer.remaining(stale), None);
        renderer.render();
        assert_eq!(mixer.remaining(fresh), Some(96));
    }
}
