use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::audio_api::Mixer;
use crate::shared::Direction;

#[derive(Clone, Debug)]
pub struct ArbitrationSettings {
    pub lockout: Duration,
    pub debounce_polls: u32,
    pub volume_step: i32,
}

impl Default for ArbitrationSettings {
    fn default() -> Self {
        Self {
            lockout: Duration::from_secs(2),
            debounce_polls: 10,
            volume_step: 5,
        }
    }
}

/// What one poll tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    LockedOut,
    Debouncing,
    Idle,
    Applied(u8),
}

struct Arbitration {
    last_remote: Instant,
    debounce: u32,
}

/// Decides whether the local control may touch the volume.
///
/// A remote set wins for `lockout` after it happened; the local control has to
/// wait that out and then another `debounce_polls` ticks. Holding the control
/// through the lockout does not let it jump in the moment the window closes.
pub struct VolumeArbitrator {
    settings: ArbitrationSettings,
    state: Mutex<Arbitration>,
}

impl VolumeArbitrator {
    pub fn new(settings: ArbitrationSettings) -> Self {
        Self::new_at(settings, Instant::now())
    }

    // startup counts as a remote set
    pub fn new_at(settings: ArbitrationSettings, now: Instant) -> Self {
        let debounce = settings.debounce_polls;
        Self {
            settings,
            state: Mutex::new(Arbitration { last_remote: now, debounce }),
        }
    }

    // remote commands go through apply_remote_volume, which arms the same way
    #[cfg(test)]
    pub fn notify_remote_volume_set_at(&self, now: Instant) {
        let mut state = self.state.lock();
        state.last_remote = now;
        state.debounce = self.settings.debounce_polls;
    }

    /// Authoritative set from a remote command. The set and the notify happen
    /// under the arbitration lock so a poll tick can't slip in between.
    pub fn apply_remote_volume(&self, mixer: &dyn Mixer, volume: i32) -> u8 {
        let mut state = self.state.lock();
        mixer.set_volume(volume);
        state.last_remote = Instant::now();
        state.debounce = self.settings.debounce_polls;
        mixer.volume()
    }

    pub fn poll(&self, mixer: &dyn Mixer, direction: Direction) -> PollOutcome {
        self.poll_at(Instant::now(), mixer, direction)
    }

    pub fn poll_at(&self, now: Instant, mixer: &dyn Mixer, direction: Direction) -> PollOutcome {
        let mut state = self.state.lock();
        if self.within_lockout(&state, now) {
            state.debounce = self.settings.debounce_polls;
            return PollOutcome::LockedOut;
        }
        if state.debounce > 0 {
            state.debounce -= 1;
            return PollOutcome::Debouncing;
        }
        if direction == Direction::Center {
            return PollOutcome::Idle;
        }

        let target = mixer.volume() as i32 + direction.sign() * self.settings.volume_step;
        mixer.set_volume(target);
        state.debounce = self.settings.debounce_polls;
        PollOutcome::Applied(mixer.volume())
    }

    pub fn is_locked_out(&self) -> bool {
        let state = self.state.lock();
        self.within_lockout(&state, Instant::now())
    }

    fn within_lockout(&self, state: &Arbitration, now: Instant) -> bool {
        now.saturating_duration_since(state.last_remote) <= self.settings.lockout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::testing::RecordingMixer;

    const TICK: Duration = Duration::from_millis(10);

    fn settings() -> ArbitrationSettings {
        ArbitrationSettings {
            lockout: Duration::from_secs(2),
            debounce_polls: 10,
            volume_step: 5,
        }
    }

    #[test]
    fn test_held_up_is_ignored_during_lockout() {
        let mixer = RecordingMixer::new(50);
        let base = Instant::now();
        let arb = VolumeArbitrator::new_at(settings(), base);
        let t0 = base + Duration::from_secs(60);

        arb.notify_remote_volume_set_at(t0);
        let mut now = t0;
        while now <= t0 + Duration::from_secs(2) {
            assert_eq!(arb.poll_at(now, &mixer, Direction::Up), PollOutcome::LockedOut);
            assert_eq!(mixer.volume(), 50);
            now += TICK;
        }

        // lockout over: the re-armed debounce still has to run out
        for _ in 0..10 {
            assert_eq!(arb.poll_at(now, &mixer, Direction::Up), PollOutcome::Debouncing);
            now += TICK;
        }
        assert_eq!(mixer.volume(), 50);
        assert_eq!(arb.poll_at(now, &mixer, Direction::Up), PollOutcome::Applied(55));
    }

    #[test]
    fn test_step_clamps_and_rearms() {
        let mixer = RecordingMixer::new(98);
        let base = Instant::now();
        let arb = VolumeArbitrator::new_at(ArbitrationSettings { debounce_polls: 2, ..settings() }, base);
        let now = base + Duration::from_secs(10);
        assert_eq!(arb.poll_at(now, &mixer, Direction::Up), PollOutcome::Debouncing);
        assert_eq!(arb.poll_at(now, &mixer, Direction::Up), PollOutcome::Debouncing);
        assert_eq!(arb.poll_at(now, &mixer, Direction::Up), PollOutcome::Applied(100));
        assert_eq!(arb.poll_at(now, &mixer, Direction::Up), PollOutcome::Debouncing);
    }

    #[test]
    fn test_centered_control_does_nothing() {
        let mixer = RecordingMixer::new(40);
        let base = Instant::now();
        let arb = VolumeArbitrator::new_at(ArbitrationSettings { debounce_polls: 0, ..settings() }, base);
        let t0 = base + Duration::from_secs(10);
        assert_eq!(arb.poll_at(t0, &mixer, Direction::Center), PollOutcome::Idle);
        assert_eq!(arb.poll_at(t0, &mixer, Direction::Down), PollOutcome::Applied(35));
        assert_eq!(mixer.volume(), 35);
    }

    #[test]
    fn test_lockout_applies_from_startup() {
        let mixer = RecordingMixer::new(40);
        let t0 = Instant::now();
        let arb = VolumeArbitrator::new_at(settings(), t0);
        assert_eq!(arb.poll_at(t0 + TICK, &mixer, Direction::Down), PollOutcome::LockedOut);
    }

    #[test]
    fn test_remote_set_rearms_lockout() {
        let mixer = RecordingMixer::new(40);
        let arb = VolumeArbitrator::new_at(
            ArbitrationSettings { lockout: Duration::from_millis(200), ..settings() },
            Instant::now(),
        );
        std::thread::sleep(Duration::from_millis(300));
        assert!(!arb.is_locked_out());
        assert_eq!(arb.apply_remote_volume(&mixer, 250), 100);
        assert!(arb.is_locked_out());
        assert_eq!(arb.poll(&mixer, Direction::Down), PollOutcome::LockedOut);
        assert_eq!(mixer.volume(), 100);
    }
}
