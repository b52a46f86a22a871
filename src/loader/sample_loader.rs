use std::path::Path;

use anyhow::Context;

use crate::audio::WaveformAsset;
use crate::audio_api::DrumKit;
use crate::config::AssetPaths;

// Load one percussion WAV at the engine rate
pub fn load(path: &Path, target_rate: u32) -> anyhow::Result<WaveformAsset> {
    let asset = WaveformAsset::load_wav(path, target_rate)
        .with_context(|| format!("loading {}", path.display()))?;
    log::info!(
        "loaded {} ({} samples @ {target_rate} Hz)",
        path.display(),
        asset.sample_count()
    );
    Ok(asset)
}

// All three or nothing; the box can't run with a missing drum
pub fn load_kit(paths: &AssetPaths, target_rate: u32) -> anyhow::Result<DrumKit> {
    Ok(DrumKit::new(
        load(&paths.kick, target_rate)?,
        load(&paths.hihat, target_rate)?,
        load(&paths.snare, target_rate)?,
    ))
}
