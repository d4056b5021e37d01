//! Short-time Fourier analysis with windowing

use super::windows::{create_window, WindowType};
use rustfft::{num_complex::Complex, FftPlanner};

/// Centered STFT: the signal is zero-padded by `fft_size / 2` on both
/// ends, giving `1 + n / hop` frames for `n` input samples.
pub struct StftProcessor {
    planner: FftPlanner<f64>,
    window: Vec<f64>,
    fft_size: usize,
    hop_size: usize,
}

impl StftProcessor {
    pub fn new(fft_size: usize, hop_size: usize, window_type: WindowType) -> Self {
        Self {
            planner: FftPlanner::new(),
            window: create_window(fft_size, window_type),
            fft_size,
            hop_size: hop_size.max(1),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn num_frames(&self, num_samples: usize) -> usize {
        if num_samples == 0 {
            0
        } else {
            1 + num_samples / self.hop_size
        }
    }

    /// Center frequency of each one-sided bin
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f64> {
        (0..=self.fft_size / 2)
            .map(|k| k as f64 * sample_rate as f64 / self.fft_size as f64)
            .collect()
    }

    /// Unwindowed, zero-padded time-domain frame `index`
    pub fn frame(&self, samples: &[f64], index: usize) -> Vec<f64> {
        self.padded_frame(samples, index, |_| 0.0)
    }

    /// Frame `index` with the end samples repeated into the padding
    pub fn frame_edge(&self, samples: &[f64], index: usize) -> Vec<f64> {
        let last = samples.len().saturating_sub(1);
        self.padded_frame(samples, index, |pos| {
            let clamped = if pos < 0 { 0 } else { last };
            samples.get(clamped).copied().unwrap_or(0.0)
        })
    }

    fn padded_frame(&self, samples: &[f64], index: usize, outside: impl Fn(isize) -> f64) -> Vec<f64> {
        let pad = self.fft_size / 2;
        let start = (index * self.hop_size) as isize - pad as isize;
        (0..self.fft_size)
            .map(|i| {
                let pos = start + i as isize;
                if pos >= 0 && (pos as usize) < samples.len() {
                    samples[pos as usize]
                } else {
                    outside(pos)
                }
            })
            .collect()
    }

    /// Visit each frame with its raw samples and one-sided power spectrum
    pub fn for_each_frame<F>(&mut self, samples: &[f64], mut visit: F)
    where
        F: FnMut(usize, &[f64], &[f64]),
    {
        let fft = self.planner.plan_fft_forward(self.fft_size);
        let bins = self.fft_size / 2 + 1;
        let mut buffer = vec![Complex::new(0.0, 0.0); self.fft_size];
        let mut power = vec![0.0; bins];

        for index in 0..self.num_frames(samples.len()) {
            let frame = self.frame(samples, index);
            for (slot, (&s, &w)) in buffer.iter_mut().zip(frame.iter().zip(&self.window)) {
                *slot = Complex::new(s * w, 0.0);
            }
            fft.process(&mut buffer);
            for (p, c) in power.iter_mut().zip(&buffer[..bins]) {
                *p = c.norm_sqr();
            }
            visit(index, &frame, &power);
        }
    }
}
