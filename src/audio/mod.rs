use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::audio_api::Mixer;
use crate::stats::TimingMarker;

mod engine;
mod error;
mod sink;
mod voice;
mod waveform;

pub use engine::{Renderer, VoiceMixer};
pub use error::{AudioError, SinkError};
pub use sink::PcmSink;
pub use waveform::WaveformAsset;

use sink::OutputDevice;

#[cfg(test)]
pub use sink::testing::MemorySink;

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub enabled: bool,
    pub sample_rate: u32, // used when no device is open
    pub period_frames: usize,
    pub voices: usize,
    pub default_volume: u8,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 44_100,
            period_frames: 512,
            voices: 30,
            default_volume: 80,
        }
    }
}

// The running render thread and what it writes to
struct RenderThread {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    device: Option<OutputDevice>, // None when rendering into a caller-supplied sink
}

pub struct MixingEngine {
    mixer: VoiceMixer,
    sample_rate: u32,
    render: Option<RenderThread>,
}

impl MixingEngine {
    /// Open the default output device and start rendering. Never fails: without a
    /// device the engine runs in degraded silent mode.
    pub fn start(settings: &EngineSettings, marker: Option<Arc<dyn TimingMarker>>) -> Self {
        let mixer = VoiceMixer::new(settings.voices, settings.default_volume);
        if !settings.enabled {
            log::warn!("audio disabled by configuration, running in silent mode");
            return Self::silent(mixer, settings.sample_rate);
        }

        let (device, writer) = match sink::open_output_device(settings.period_frames) {
            Ok(opened) => opened,
            Err(e) => {
                log::warn!("playback open error: {e}");
                log::warn!("proceeding in silent mode (no audio output)");
                return Self::silent(mixer, settings.sample_rate);
            }
        };

        let sample_rate = device.sample_rate;
        let period_frames = device.period_frames;
        match spawn_render_thread(mixer.clone(), Box::new(writer), period_frames, marker) {
            Ok((stop_tx, handle)) => {
                log::info!("rendering to '{}' ({} ch)", device.name, device.channels);
                Self {
                    mixer,
                    sample_rate,
                    render: Some(RenderThread {
                        stop_tx: Some(stop_tx),
                        handle: Some(handle),
                        device: Some(device),
                    }),
                }
            }
            Err(e) => {
                log::warn!("{e}, proceeding in silent mode");
                Self::silent(mixer, settings.sample_rate)
            }
        }
    }

    // render into `sink` instead of a cpal device
    #[cfg(test)]
    pub fn start_with_sink(
        settings: &EngineSettings,
        sink: Box<dyn PcmSink>,
        marker: Option<Arc<dyn TimingMarker>>,
    ) -> Result<Self, AudioError> {
        let mixer = VoiceMixer::new(settings.voices, settings.default_volume);
        let (stop_tx, handle) =
            spawn_render_thread(mixer.clone(), sink, settings.period_frames, marker)?;
        Ok(Self {
            mixer,
            sample_rate: settings.sample_rate,
            render: Some(RenderThread {
                stop_tx: Some(stop_tx),
                handle: Some(handle),
                device: None,
            }),
        })
    }

    fn silent(mixer: VoiceMixer, sample_rate: u32) -> Self {
        mixer.set_silent(true);
        Self { mixer, sample_rate, render: None }
    }

    // Producers enqueue and set the volume through this handle
    pub fn mixer(&self) -> VoiceMixer {
        self.mixer.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_silent(&self) -> bool {
        self.render.is_none()
    }

    pub fn volume(&self) -> u8 {
        self.mixer.volume()
    }

    /// Let the render thread finish its cycle, flush, and release the device.
    pub fn stop(&mut self) {
        let Some(mut render) = self.render.take() else {
            return;
        };
        drop(render.stop_tx.take()); // disconnect wakes the loop
        if let Some(handle) = render.handle.take() {
            if handle.join().is_err() {
                log::error!("render thread panicked");
            }
        }
        if let Some(device) = render.device.take() {
            device.pause();
        }
        self.mixer.set_silent(true);
        log::info!("audio mixer stopped");
    }
}

impl Drop for MixingEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_render_thread(
    mixer: VoiceMixer,
    sink: Box<dyn PcmSink>,
    period_frames: usize,
    marker: Option<Arc<dyn TimingMarker>>,
) -> Result<(Sender<()>, JoinHandle<()>), AudioError> {
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
    let renderer = Renderer::new(mixer, period_frames);
    let handle = std::thread::Builder::new()
        .name("audio-render".into())
        .spawn(move || render_loop(renderer, sink, stop_rx, marker))
        .map_err(|e| AudioError::Spawn(e.to_string()))?;
    Ok((stop_tx, handle))
}

fn render_loop(
    mut renderer: Renderer,
    mut sink: Box<dyn PcmSink>,
    stop_rx: Receiver<()>,
    marker: Option<Arc<dyn TimingMarker>>,
) {
    log::info!("render thread started ({} frames/period)", renderer.period_frames());
    while let Err(TryRecvError::Empty) = stop_rx.try_recv() {
        if let Some(marker) = &marker {
            marker.mark();
        }
        let period = renderer.render();
        write_period(sink.as_mut(), period);
    }
    sink.drain();
    log::info!("render thread stopped");
}

// One write, one recovery attempt on underrun, never gives up the thread
fn write_period(sink: &mut dyn PcmSink, period: &[i16]) {
    match sink.write(period) {
        Ok(()) => {}
        Err(SinkError::Underrun) => {
            log::warn!("audio underrun, recovering");
            if let Err(e) = sink.recover() {
                log::error!("failed to recover from underrun: {e}");
            } else if let Err(e) = sink.write(period) {
                log::error!("failed writing audio after recovery: {e}");
            }
        }
        Err(e) => log::error!("failed writing audio: {e}"),
    }
}
