// Local controls: the volume arbitration protocol, air-drum detection and
// the loop that polls both.

pub mod air_drum;
pub mod arbitrator;
pub mod direction;
pub mod poller;

pub use air_drum::{AirDrumSettings, ShakenAccel};
pub use arbitrator::{ArbitrationSettings, VolumeArbitrator};
pub use direction::HeldDirection;
pub use poller::{InputPoller, LocalControls};
