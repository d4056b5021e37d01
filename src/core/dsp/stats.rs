//! Statistical and spectral analysis functions

/// Moving average with zero padding, always dividing by `window_size`.
/// Output `i` averages `data[i - w/2 ..= i + (w-1)/2]`, so edges taper
/// toward zero and even windows lean one sample to the left.
pub fn moving_average(data: &[f64], window_size: usize) -> Vec<f64> {
    if data.is_empty() || window_size <= 1 {
        return data.to_vec();
    }

    let behind = window_size / 2;
    let ahead = (window_size - 1) / 2;
    let scale = window_size as f64;
    (0..data.len())
        .map(|i| {
            let lo = i.saturating_sub(behind);
            let hi = (i + ahead).min(data.len() - 1);
            data[lo..=hi].iter().sum::<f64>() / scale
        })
        .collect()
}

/// Running median with edge replication at both ends
pub fn median_filter(data: &[f64], size: usize) -> Vec<f64> {
    if data.is_empty() || size <= 1 {
        return data.to_vec();
    }

    let half = size / 2;
    let last = data.len() - 1;
    let mut window = Vec::with_capacity(size);

    (0..data.len())
        .map(|i| {
            window.clear();
            for k in 0..size {
                let offset = i as isize + k as isize - half as isize;
                let idx = offset.clamp(0, last as isize) as usize;
                window.push(data[idx]);
            }
            median(&window)
        })
        .collect()
}

/// Median of a slice; even lengths average the middle pair
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let var = data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64;
    var.sqrt()
}

/// Median absolute deviation from the median
pub fn median_abs_deviation(data: &[f64]) -> f64 {
    let m = median(data);
    let deviations: Vec<f64> = data.iter().map(|x| (x - m).abs()).collect();
    median(&deviations)
}

/// Compute RMS (Root Mean Square)
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Compute peak amplitude
pub fn peak_amplitude(samples: &[f64]) -> f64 {
    samples.iter().map(|s| s.abs()).fold(0.0f64, f64::max)
}

/// Zero-crossing rate of one frame: sign changes between neighbours
/// divided by the frame length. Magnitudes up to 1e-10 count as zero,
/// and zero counts as positive.
pub fn zero_crossing_rate(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let negative = |x: f64| x < 0.0 && x.abs() > ZCR_THRESHOLD;
    let crossings = samples
        .windows(2)
        .filter(|w| negative(w[0]) != negative(w[1]))
        .count();

    crossings as f64 / samples.len() as f64
}

const ZCR_THRESHOLD: f64 = 1e-10;

/// Frame RMS from a one-sided power spectrum of a `frame_length`-point
/// windowed FFT. DC and (for even lengths) Nyquist bins count half.
pub fn spectral_rms(power: &[f64], frame_length: usize) -> f64 {
    if power.is_empty() || frame_length == 0 {
        return 0.0;
    }
    let last = power.len() - 1;
    let total: f64 = power
        .iter()
        .enumerate()
        .map(|(k, &p)| {
            if k == 0 || (k == last && frame_length % 2 == 0) {
                0.5 * p
            } else {
                p
            }
        })
        .sum();
    (2.0 * total / (frame_length * frame_length) as f64).sqrt()
}

/// Spectral centroid (brightness) over magnitude bins
pub fn spectral_centroid(magnitudes: &[f64], frequencies: &[f64], eps: f64) -> f64 {
    let total: f64 = magnitudes.iter().sum();
    let weighted: f64 = magnitudes
        .iter()
        .zip(frequencies)
        .map(|(m, f)| m * f)
        .sum();
    weighted / (total + eps)
}

/// Spectral flatness (Wiener entropy) over power bins.
/// Returns ~1.0 for white noise, approaches 0.0 for tonal signals
pub fn spectral_flatness(power: &[f64], amin: f64, eps: f64) -> f64 {
    if power.is_empty() {
        return 0.0;
    }
    let n = power.len() as f64;

    let log_sum: f64 = power.iter().map(|&p| p.max(amin).ln()).sum();
    let geometric_mean = (log_sum / n).exp();
    let arithmetic_mean = power.iter().map(|&p| p.max(amin)).sum::<f64>() / n;

    geometric_mean / (arithmetic_mean + eps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        let samples = vec![1.0, -1.0, 1.0, -1.0];
        assert!((rms(&samples) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_moving_average_zero_padded_edges() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let avg = moving_average(&data, 5);
        assert_eq!(avg.len(), data.len());
        let expected = [
            6.0 / 5.0,  // 0+0+1+2+3
            10.0 / 5.0, // 0+1+2+3+4
            3.0,
            4.0,
            18.0 / 5.0, // 3+4+5+6+0
            15.0 / 5.0, // 4+5+6+0+0
        ];
        for (got, want) in avg.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{:?}", avg);
        }
    }

    #[test]
    fn test_moving_average_even_window() {
        // window of 4 covers i-2 ..= i+1
        let avg = moving_average(&[4.0, 8.0, 12.0, 16.0], 4);
        let expected = [12.0 / 4.0, 24.0 / 4.0, 40.0 / 4.0, 36.0 / 4.0];
        for (got, want) in avg.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{:?}", avg);
        }
        // shorter input than the window still keeps its length
        let short = moving_average(&[5.0, 5.0], 5);
        assert_eq!(short, vec![2.0, 2.0]);
    }

    #[test]
    fn test_median_filter_removes_spike() {
        let data = vec![1.0, 1.0, 9.0, 1.0, 1.0, 1.0];
        let filtered = median_filter(&data, 5);
        assert!(filtered.iter().all(|&v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_median_filter_replicates_edges() {
        let data = vec![0.0, 10.0, 20.0];
        let filtered = median_filter(&data, 5);
        // window at 0 is [0, 0, 0, 10, 20]
        assert_eq!(filtered[0], 0.0);
        assert_eq!(filtered[2], 20.0);
    }

    #[test]
    fn test_mad_and_std() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 100.0];
        assert_eq!(median_abs_deviation(&data), 1.0);
        assert!((std_dev(&[2.0, 4.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_crossing_rate() {
        let samples = vec![1.0, -1.0, 1.0, -1.0, 1.0];
        // 4 crossings over 5 samples
        assert!((zero_crossing_rate(&samples) - 0.8).abs() < 1e-12);
        assert_eq!(zero_crossing_rate(&[0.5, 0.5, 0.0]), 0.0);
        // tiny negatives are treated as zero
        assert_eq!(zero_crossing_rate(&[0.5, -1e-12, 0.5, 0.5]), 0.0);
    }

    #[test]
    fn test_spectral_rms_matches_time_domain() {
        use crate::core::dsp::{StftProcessor, WindowType};
        use std::f64::consts::PI;

        let n_fft = 64;
        let mut stft = StftProcessor::new(n_fft, 16, WindowType::Hann);
        let window = crate::core::dsp::create_window(n_fft, WindowType::Hann);
        let samples: Vec<f64> = (0..256).map(|i| (2.0 * PI * 5.0 * i as f64 / 64.0).sin()).collect();

        let mut checked = 0;
        stft.for_each_frame(&samples, |_, frame, power| {
            let windowed: Vec<f64> = frame.iter().zip(&window).map(|(s, w)| s * w).collect();
            assert!((spectral_rms(power, n_fft) - rms(&windowed)).abs() < 1e-9);
            checked += 1;
        });
        assert_eq!(checked, stft.num_frames(samples.len()));
    }

    #[test]
    fn test_spectral_flatness_tonal() {
        let mut power = vec![1e-6; 100];
        power[50] = 1.0;
        assert!(spectral_flatness(&power, 1e-10, 1e-9) < 0.1);
    }

    #[test]
    fn test_spectral_flatness_noise() {
        let power = vec![1.0; 100];
        assert!(spectral_flatness(&power, 1e-10, 1e-9) > 0.99);
    }

    #[test]
    fn test_spectral_centroid() {
        let mags = vec![0.0, 1.0, 0.0, 1.0];
        let freqs = vec![0.0, 100.0, 200.0, 300.0];
        assert!((spectral_centroid(&mags, &freqs, 1e-9) - 200.0).abs() < 1e-6);
    }
}
