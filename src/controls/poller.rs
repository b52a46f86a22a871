use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::audio_api::{DrumKit, Mixer};
use crate::stats::TimingMarker;

use super::air_drum::{AccelSource, AirDrumDetector, AirDrumSettings};
use super::arbitrator::{PollOutcome, VolumeArbitrator};
use super::direction::DirectionSource;

// What the poller reads each tick, and the sounds air-drum hits play
pub struct LocalControls {
    pub direction: Arc<dyn DirectionSource>,
    pub accel: Arc<dyn AccelSource>,
    pub air_drum: AirDrumSettings,
    pub kit: DrumKit,
}

/// Local-control polling thread: air-drum detection and one arbitration tick
/// per period.
pub struct InputPoller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl InputPoller {
    pub fn spawn(
        arbitrator: Arc<VolumeArbitrator>,
        mixer: Arc<dyn Mixer>,
        controls: LocalControls,
        period: Duration,
        marker: Option<Arc<dyn TimingMarker>>,
    ) -> anyhow::Result<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let handle = std::thread::Builder::new()
            .name("input-poll".into())
            .spawn(move || {
                log::info!("input polling every {} ms", period.as_millis());
                let LocalControls { direction: source, accel, air_drum, kit } = controls;
                let mut detector = AirDrumDetector::new(air_drum, accel.read());
                loop {
                    if let Some(marker) = &marker {
                        marker.mark();
                    }
                    for drum in detector.poll(accel.read()) {
                        log::debug!("air-drum hit: {drum:?}");
                        kit.play(mixer.as_ref(), drum);
                    }
                    let direction = source.direction();
                    if let PollOutcome::Applied(volume) = arbitrator.poll(mixer.as_ref(), direction) {
                        log::debug!("local control set volume to {volume}");
                    }
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                log::info!("input polling stopped");
            })?;
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("input poll thread panicked");
            }
        }
    }
}

impl Drop for InputPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::audio_api::testing::RecordingMixer;
    use crate::controls::air_drum::{Axis, ShakenAccel};
    use crate::controls::arbitrator::ArbitrationSettings;
    use crate::controls::direction::HeldDirection;
    use crate::shared::{Direction, Drum};
    use crate::stats::IntervalTimer;

    fn unlocked() -> Arc<VolumeArbitrator> {
        Arc::new(VolumeArbitrator::new(ArbitrationSettings {
            lockout: Duration::ZERO,
            debounce_polls: 0,
            volume_step: 5,
        }))
    }

    fn controls(
        mixer: &RecordingMixer,
        direction: Arc<HeldDirection>,
        accel: Arc<ShakenAccel>,
    ) -> LocalControls {
        LocalControls {
            direction,
            accel,
            air_drum: AirDrumSettings::default(),
            kit: mixer.kit.clone(),
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_poller_applies_held_direction() {
        let mixer = Arc::new(RecordingMixer::new(50));
        let held = Arc::new(HeldDirection::new(Duration::from_secs(60)));
        held.press(Direction::Up);
        let timer = Arc::new(IntervalTimer::new());

        let mut poller = InputPoller::spawn(
            unlocked(),
            mixer.clone(),
            controls(&mixer, held, Arc::new(ShakenAccel::default())),
            Duration::from_millis(2),
            Some(timer.clone()),
        )
        .unwrap();

        wait_until(|| mixer.volume() >= 100);
        poller.stop();
        assert_eq!(mixer.volume(), 100);
        assert!(timer.summary().is_some());
        assert!(mixer.take().is_empty());
    }

    #[test]
    fn test_poller_plays_air_drum_hits() {
        let mixer = Arc::new(RecordingMixer::new(50));
        let accel = Arc::new(ShakenAccel::default());
        let mut poller = InputPoller::spawn(
            unlocked(),
            mixer.clone(),
            controls(&mixer, Arc::new(HeldDirection::default()), accel.clone()),
            Duration::from_millis(2),
            None,
        )
        .unwrap();

        accel.jolt(Axis::Z);
        let mut played = Vec::new();
        wait_until(|| {
            played.extend(mixer.take());
            !played.is_empty()
        });
        poller.stop();
        played.extend(mixer.take());
        assert_eq!(played, vec![Drum::Kick]);
        assert_eq!(mixer.volume(), 50);
    }
}
