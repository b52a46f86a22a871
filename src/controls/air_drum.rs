use parking_lot::Mutex;

use crate::shared::Drum;

// Raw readings sit around mid-scale of a 12-bit converter at rest
pub const REST: i32 = 2048;
const JOLT: i32 = 1500;

#[derive(Clone, Debug)]
pub struct AirDrumSettings {
    pub threshold: u32,
    pub debounce_polls: u32,
}

impl Default for AirDrumSettings {
    fn default() -> Self {
        Self { threshold: 1000, debounce_polls: 15 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acceleration {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Acceleration {
    pub const AT_REST: Self = Self { x: REST, y: REST, z: REST };

    fn get(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    fn get_mut(&mut self, axis: Axis) -> &mut i32 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn drum(self) -> Drum {
        match self {
            Axis::X => Drum::Snare,
            Axis::Y => Drum::HiHat,
            Axis::Z => Drum::Kick,
        }
    }
}

/// Three-axis reading the polling loop samples every tick.
pub trait AccelSource: Send + Sync {
    fn read(&self) -> Acceleration;
}

#[derive(Clone, Copy, Default)]
struct AxisState {
    last: i32,
    debounce: u32,
}

// A sharp change on one axis is a hit on that axis' drum. Each axis then sits
// out `debounce_polls` polls before it can fire again.
pub struct AirDrumDetector {
    settings: AirDrumSettings,
    axes: [AxisState; 3],
}

impl AirDrumDetector {
    pub fn new(settings: AirDrumSettings, initial: Acceleration) -> Self {
        let axes = Axis::ALL.map(|axis| AxisState { last: initial.get(axis), debounce: 0 });
        Self { settings, axes }
    }

    // hits come back in x, y, z order
    pub fn poll(&mut self, reading: Acceleration) -> Vec<Drum> {
        let mut hits = Vec::new();
        for (axis, state) in Axis::ALL.into_iter().zip(self.axes.iter_mut()) {
            let value = reading.get(axis);
            state.debounce = state.debounce.saturating_sub(1);
            if state.debounce == 0 && value.abs_diff(state.last) > self.settings.threshold {
                hits.push(axis.drum());
                state.debounce = self.settings.debounce_polls;
            }
            state.last = value;
        }
        hits
    }
}

// Stand-in accelerometer for a host machine: each jolt flips one axis between
// rest and a swing well past the trigger threshold.
pub struct ShakenAccel {
    reading: Mutex<Acceleration>,
}

impl Default for ShakenAccel {
    fn default() -> Self {
        Self { reading: Mutex::new(Acceleration::AT_REST) }
    }
}

impl ShakenAccel {
    pub fn jolt(&self, axis: Axis) {
        let mut reading = self.reading.lock();
        let value = reading.get_mut(axis);
        *value = if *value == REST { REST + JOLT } else { REST };
    }
}

impl AccelSource for ShakenAccel {
    fn read(&self) -> Acceleration {
        *self.reading.lock()
    }
}
