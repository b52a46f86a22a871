use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, SendTimeoutError, Sender};
use parking_lot::Mutex;

use super::error::{AudioError, SinkError};

// Periods queued between the render thread and the device callback. Two means
// the render thread is at most one period ahead of what's playing.
const QUEUED_PERIODS: usize = 2;

// Where rendered periods go. `write` blocks until the device can take the
// period, which is what paces the render thread.
pub trait PcmSink: Send {
    fn write(&mut self, period: &[i16]) -> Result<(), SinkError>;

    // Bring the device back after an underrun (drop stale audio, clear the flag)
    fn recover(&mut self) -> Result<(), SinkError>;

    // Wait for everything already written to play out
    fn drain(&mut self);
}

// ── cpal output ─────────────────────────────────────────────────

// Owns the cpal stream. Stays with the engine on the thread that opened it;
// only the StreamWriter goes to the render thread.
pub struct OutputDevice {
    pub sample_rate: u32,
    pub period_frames: usize,
    pub channels: usize,
    pub name: String,
    stream: cpal::Stream,
}

impl OutputDevice {
    pub fn pause(&self) {
        if let Err(e) = self.stream.pause() {
            log::debug!("could not pause output stream: {e}");
        }
    }
}

// Render-thread side of the cpal stream
pub struct StreamWriter {
    tx: Sender<Vec<i16>>,
    stale_rx: Receiver<Vec<i16>>, // same queue as the callback reads
    recycle_rx: Receiver<Vec<i16>>,
    starved: Arc<AtomicBool>,
    stream_error: Arc<Mutex<Option<String>>>,
    write_timeout: Duration,
    period: Duration,
}

impl PcmSink for StreamWriter {
    fn write(&mut self, period: &[i16]) -> Result<(), SinkError> {
        if let Some(err) = self.stream_error.lock().take() {
            return Err(SinkError::Stream(err));
        }
        if self.starved.load(Ordering::Relaxed) {
            return Err(SinkError::Underrun);
        }

        // reuse a buffer the callback is done with when there is one
        let mut buf = self.recycle_rx.try_recv().unwrap_or_default();
        buf.clear();
        buf.extend_from_slice(period);

        match self.tx.send_timeout(buf, self.write_timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(SinkError::Timeout),
            Err(SendTimeoutError::Disconnected(_)) => Err(SinkError::Disconnected),
        }
    }

    fn recover(&mut self) -> Result<(), SinkError> {
        // anything still queued would only play late, throw it away like a pcm prepare
        let mut dropped = 0;
        while self.stale_rx.try_recv().is_ok() {
            dropped += 1;
        }
        self.starved.store(false, Ordering::Relaxed);
        log::debug!("output recovered, {dropped} stale periods dropped");
        Ok(())
    }

    fn drain(&mut self) {
        let deadline = Instant::now() + self.period * (QUEUED_PERIODS as u32 + 1);
        while !self.tx.is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        // the callback still holds the last period it took
        std::thread::sleep(self.period);
    }
}

// Callback side: hands out queued samples one at a time
struct PeriodFeed {
    rx: Receiver<Vec<i16>>,
    recycle_tx: Sender<Vec<i16>>,
    pending: Vec<i16>,
    pos: usize,
    primed: bool, // no underruns before the first period arrives
    starved: Arc<AtomicBool>,
}

impl PeriodFeed {
    fn next_sample(&mut self) -> i16 {
        if self.pos >= self.pending.len() {
            match self.rx.try_recv() {
                Ok(next) => {
                    let done = std::mem::replace(&mut self.pending, next);
                    let _ = self.recycle_tx.try_send(done);
                    self.pos = 0;
                    self.primed = true;
                }
                Err(_) => {
                    if self.primed {
                        self.starved.store(true, Ordering::Relaxed);
                    }
                    return 0;
                }
            }
        }
        let sample = self.pending.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        sample
    }

    // mono in, every device channel gets the same sample
    fn fill<T: Copy>(&mut self, data: &mut [T], channels: usize, convert: impl Fn(i16) -> T) {
        for frame in data.chunks_mut(channels) {
            let value = convert(self.next_sample());
            frame.fill(value);
        }
    }
}

pub fn open_output_device(
    requested_period: usize,
) -> Result<(OutputDevice, StreamWriter), AudioError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
    let name = device.name().unwrap_or_else(|_| "unknown".to_string());
    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::Config(e.to_string()))?;

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels().max(1) as usize;
    let sample_format = supported.sample_format();

    // negotiate the period against what the device allows
    let period_frames = match supported.buffer_size() {
        cpal::SupportedBufferSize::Range { min, max } => {
            (requested_period as u32).clamp(*min, *max) as usize
        }
        cpal::SupportedBufferSize::Unknown => requested_period,
    };
    let mut config: cpal::StreamConfig = supported.into();
    config.buffer_size = cpal::BufferSize::Fixed(period_frames as u32);

    let (tx, rx) = crossbeam_channel::bounded::<Vec<i16>>(QUEUED_PERIODS);
    let (recycle_tx, recycle_rx) = crossbeam_channel::bounded::<Vec<i16>>(QUEUED_PERIODS + 1);
    let starved = Arc::new(AtomicBool::new(false));
    let stream_error = Arc::new(Mutex::new(None));

    let mut feed = PeriodFeed {
        rx: rx.clone(),
        recycle_tx,
        pending: Vec::new(),
        pos: 0,
        primed: false,
        starved: Arc::clone(&starved),
    };
    let err_slot = Arc::clone(&stream_error);
    let err_fn = move |err: cpal::StreamError| {
        log::error!("audio output stream error: {err}");
        *err_slot.lock() = Some(err.to_string());
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                feed.fill(data, channels, |s| s as f32 / 32768.0);
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _info: &cpal::OutputCallbackInfo| {
                feed.fill(data, channels, |s| s);
            },
            err_fn,
            None,
        ),
        other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
    }
    .map_err(|e| AudioError::Build(e.to_string()))?;

    stream.play().map_err(|e| AudioError::Play(e.to_string()))?;

    let period = Duration::from_secs_f64(period_frames as f64 / sample_rate.max(1) as f64);
    log::info!(
        "audio output '{name}': {sample_rate} Hz, {channels} ch, {period_frames} frames/period ({:.1} ms)",
        period.as_secs_f64() * 1000.0
    );

    let device = OutputDevice {
        sample_rate,
        period_frames,
        channels,
        name,
        stream,
    };
    let writer = StreamWriter {
        tx,
        stale_rx: rx,
        recycle_rx,
        starved,
        stream_error,
        write_timeout: period * 4 + Duration::from_millis(50),
        period,
    };
    Ok((device, writer))
}
