// Hit tables, one row per half-beat of a 4/4 measure.
// Within a step the hi-hat always comes first.

use crate::shared::{BeatMode, Drum, STEPS_PER_MEASURE};

use Drum::{HiHat, Kick, Snare};

const ROCK: [&[Drum]; STEPS_PER_MEASURE] = [
    &[HiHat, Kick],
    &[HiHat],
    &[HiHat, Snare],
    &[HiHat],
    &[HiHat, Kick],
    &[HiHat],
    &[HiHat, Snare],
    &[HiHat],
];

const CUSTOM: [&[Drum]; STEPS_PER_MEASURE] = [
    &[HiHat, Kick],
    &[HiHat],
    &[HiHat],
    &[HiHat],
    &[HiHat, Snare],
    &[HiHat],
    &[HiHat],
    &[HiHat],
];

/// Drums fired at `step` (taken modulo the measure length).
pub fn hits(mode: BeatMode, step: u64) -> &'static [Drum] {
    let step = (step % STEPS_PER_MEASURE as u64) as usize;
    match mode {
        BeatMode::None => &[],
        BeatMode::Rock => ROCK[step],
        BeatMode::Custom => CUSTOM[step],
    }
}
