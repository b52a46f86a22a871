use std::path::Path;

// One decoded percussion sound: mono, signed 16-bit, already at the engine's
// sample rate. Never mutated after construction; voices share it through an Arc.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformAsset {
    samples: Vec<i16>,
}

impl WaveformAsset {
    #[cfg(test)]
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    // Load a WAV file from disk, keep the first channel, resample to `target_rate`
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int if spec.bits_per_sample == 16 => reader
                .samples::<i16>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => { // rescale 8/24/32-bit ints to 16 bits
                let bits = spec.bits_per_sample as u32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| to_i16(x, bits)))
                    .collect::<Result<Vec<_>, _>>()?
            }
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|x| (x.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect::<Result<Vec<_>, _>>()?,
        };

        // mono only, so drop every channel but the first
        let mut samples: Vec<i16> = interleaved.into_iter().step_by(channels).collect();

        if spec.sample_rate != target_rate {
            samples = resample_linear(&samples, spec.sample_rate, target_rate);
        }

        if samples.is_empty() {
            anyhow::bail!("{} contains no audio", path.display());
        }

        log::debug!(
            "loaded {} ({} Hz, {} ch) -> {} samples",
            path.display(),
            spec.sample_rate,
            spec.channels,
            samples.len()
        );
        Ok(Self { samples })
    }
}

fn to_i16(sample: i32, bits: u32) -> i16 {
    let scaled = if bits < 16 {
        sample << (16 - bits)
    } else {
        sample >> (bits - 16)
    };
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn resample_linear(samples: &[i16], source_rate: u32, target_rate: u32) -> Vec<i16> {
    if source_rate == target_rate || samples.is_empty() || source_rate == 0 {
        return samples.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio; // fractional position in the source
        let idx = src_pos.floor() as usize;
        let frac = src_pos - idx as f64;
        if idx >= samples.len() - 1 {
            out.push(samples[samples.len() - 1]);
        } else {
            let a = samples[idx] as f64;
            let b = samples[idx + 1] as f64;
            out.push((a * (1.0 - frac) + b * frac).round() as i16);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_mono_same_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kick.wav");
        write_wav(&path, 44_100, 1, &[1, -2, 300, i16::MIN]);

        let asset = WaveformAsset::load_wav(&path, 44_100).unwrap();
        assert_eq!(asset.samples(), &[1, -2, 300, i16::MIN]);
        assert_eq!(asset.sample_count(), 4);
    }

    #[test]
    fn test_load_stereo_keeps_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hat.wav");
        write_wav(&path, 44_100, 2, &[10, 99, 20, 99, 30, 99]);

        let asset = WaveformAsset::load_wav(&path, 44_100).unwrap();
        assert_eq!(asset.samples(), &[10, 20, 30]);
    }

    #[test]
    fn test_load_resamples_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snare.wav");
        write_wav(&path, 22_050, 1, &[0, 100, 200, 300]);

        let asset = WaveformAsset::load_wav(&path, 44_100).unwrap();
        assert_eq!(asset.sample_count(), 8);
        assert_eq!(&asset.samples()[..4], &[0, 50, 100, 150]);
    }

    #[test]
    fn test_load_8_bit_at_full_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lofi.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [-128i8, 0, 64, 127] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let asset = WaveformAsset::load_wav(&path, 8_000).unwrap();
        assert_eq!(asset.samples(), &[i16::MIN, 0, 16_384, 32_512]);
    }

    #[test]
    fn test_int_widths_rescale_to_16_bits() {
        assert_eq!(to_i16(-8_388_608, 24), i16::MIN);
        assert_eq!(to_i16(0x12_3456, 24), 0x1234);
        assert_eq!(to_i16(i32::MAX, 32), i16::MAX);
    }

    #[test]
    fn test_load_rejects_empty_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, 44_100, 1, &[]);
        assert!(WaveformAsset::load_wav(&path, 44_100).is_err());
        assert!(WaveformAsset::load_wav(&dir.path().join("nope.wav"), 44_100).is_err());
    }
}
