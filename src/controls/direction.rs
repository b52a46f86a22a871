use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::shared::Direction;

// A terminal only reports presses and auto-repeats, so a key counts as held
// until this long passes without another one.
pub const HOLD_TIMEOUT: Duration = Duration::from_millis(500);

/// Level signal the polling loop reads every tick.
pub trait DirectionSource: Send + Sync {
    fn direction(&self) -> Direction;
}

struct Held {
    direction: Direction,
    since: Instant,
}

/// Direction fed by key presses that lapses back to center on its own.
pub struct HeldDirection {
    held: Mutex<Option<Held>>,
    timeout: Duration,
}

impl Default for HeldDirection {
    fn default() -> Self {
        Self::new(HOLD_TIMEOUT)
    }
}

impl HeldDirection {
    pub fn new(timeout: Duration) -> Self {
        Self { held: Mutex::new(None), timeout }
    }

    pub fn press(&self, direction: Direction) {
        self.press_at(direction, Instant::now());
    }

    pub fn press_at(&self, direction: Direction, now: Instant) {
        *self.held.lock() = match direction {
            Direction::Center => None,
            direction => Some(Held { direction, since: now }),
        };
    }

    pub fn release(&self) {
        *self.held.lock() = None;
    }

    pub fn direction_at(&self, now: Instant) -> Direction {
        let mut held = self.held.lock();
        let current = held.as_ref().map(|h| (h.direction, h.since));
        match current {
            Some((direction, since)) if now.saturating_duration_since(since) <= self.timeout => {
                direction
            }
            Some(_) => {
                *held = None;
                Direction::Center
            }
            None => Direction::Center,
        }
    }
}

impl DirectionSource for HeldDirection {
    fn direction(&self) -> Direction {
        self.direction_at(Instant::now())
    }
}
