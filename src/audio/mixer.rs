//! Combining capture sources into a single mono track.
//!
//! Pure functions, no state.

/// Mix sample vectors (all at the same sample rate) into one mono output.
/// Shorter inputs are zero-padded; the result is averaged and normalized so
/// it stays within [-1.0, 1.0].
pub fn mix(sources: &[Vec<f32>]) -> Vec<f32> {
    let non_empty: Vec<&Vec<f32>> = sources.iter().filter(|s| !s.is_empty()).collect();

    if non_empty.is_empty() {
        return Vec::new();
    }
    if non_empty.len() == 1 {
        return non_empty[0].clone();
    }

    let max_len = non_empty.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut mixed = vec![0.0f32; max_len];

    for source in &non_empty {
        for (i, &sample) in source.iter().enumerate() {
            mixed[i] += sample;
        }
    }

    let num_sources = non_empty.len() as f32;
    for sample in &mut mixed {
        *sample /= num_sources;
    }

    let max_abs = mixed.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if max_abs > 1.0 {
        for sample in &mut mixed {
            *sample /= max_abs;
        }
    }

    mixed
}

/// Resample with linear interpolation. Good enough for speech.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio).ceil() as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f64;

        let sample = if src_idx + 1 < samples.len() {
            samples[src_idx] as f64 * (1.0 - frac) + samples[src_idx + 1] as f64 * frac
        } else if src_idx < samples.len() {
            samples[src_idx] as f64
        } else {
            0.0
        };

        resampled.push(sample as f32);
    }

    resampled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_empty() {
        assert!(mix(&[]).is_empty());
    }

    #[test]
    fn test_mix_single_source_passthrough() {
        let source = vec![0.5, -0.3, 0.1];
        assert_eq!(mix(&[source.clone()]), source);
    }

    #[test]
    fn test_mix_averages_two_sources() {
        let a = vec![0.5, 0.5];
        let b = vec![0.1, 0.3];
        let result = mix(&[a, b]);
        assert!((result[0] - 0.3).abs() < 1e-6);
        assert!((result[1] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_mix_zero_pads_shorter_input() {
        let a = vec![1.0, 1.0];
        let b = vec![1.0, 1.0, 1.0, 1.0];
        let result = mix(&[a, b]);
        assert_eq!(result.len(), 4);
        assert_eq!(result[0], 1.0);
        assert_eq!(result[2], 0.5);
    }

    #[test]
    fn test_mix_ignores_empty_source() {
        let a = vec![0.5, 0.3];
        assert_eq!(mix(&[a.clone(), Vec::new()]), a);
    }

    #[test]
    fn test_mix_stays_in_range() {
        let result = mix(&[vec![1.0, -1.0], vec![1.0, -1.0]]);
        for s in &result {
            assert!(s.abs() <= 1.0);
        }
    }

    #[test]
    fn test_resample_same_rate_passthrough() {
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_downsamples_three_to_one() {
        let samples: Vec<f32> = (0..48).map(|i| i as f32).collect();
        assert_eq!(resample(&samples, 48000, 16000).len(), 16);
    }

    #[test]
    fn test_resample_empty() {
        assert!(resample(&[], 48000, 16000).is_empty());
    }
}
