use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::controls::{HeldDirection, ShakenAccel};
use crate::shared::Drum;
use crate::stats::IntervalSummary;

// how long a pad label stays lit after a key hit
const FLASH: Duration = Duration::from_millis(150);

// state local to the tui: the arrow keys stand in for the joystick, x/y/z
// shake the accelerometer, and the latest stats window is kept here between
// reports
pub struct TuiState {
    pub direction: Arc<HeldDirection>,
    pub accel: Arc<ShakenAccel>,
    pub audio_stats: Option<IntervalSummary>,
    pub control_stats: Option<IntervalSummary>,
    last_hit: Option<(Drum, Instant)>,
}

impl TuiState {
    pub fn new(direction: Arc<HeldDirection>, accel: Arc<ShakenAccel>) -> Self {
        Self {
            direction,
            accel,
            audio_stats: None,
            control_stats: None,
            last_hit: None,
        }
    }

    pub fn note_hit(&mut self, drum: Drum) {
        self.last_hit = Some((drum, Instant::now()));
    }

    pub fn flashing(&self) -> Option<Drum> {
        self.last_hit
            .filter(|(_, at)| at.elapsed() < FLASH)
            .map(|(drum, _)| drum)
    }
}
