//! Recovers the frequency a rendered tone actually plays over time.

pub mod stft;
pub mod window;

use self::stft::ShortTimeFourierTransform;
use self::window::HannWindow;
use std::num::NonZeroUsize;

const FFT_SIZE: usize = 8192;
const WINDOW_SIZE: usize = 4096;
const STEP_SIZE: usize = 1024;

const fn non_zero(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => panic!("size must be non-zero"),
    }
}

/// The dominant frequency of one analysis frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitchFrame {
    /// Seconds from the start of the signal to the center of the frame.
    pub t: f64,
    /// The strongest frequency in the frame, in Hertz.
    pub hz: f64,
}

/// Tracks the strongest frequency of a mono signal frame by frame.
pub struct PitchTracker {
    stft: ShortTimeFourierTransform<f32>,
    sample_rate: u32,
    magnitudes: Vec<f32>,
    /// Index of the first sample of the next frame.
    frame_start: usize,
}

impl PitchTracker {
    pub fn new(sample_rate: u32) -> Self {
        let stft = ShortTimeFourierTransform::new(
            const { non_zero(FFT_SIZE) },
            const { non_zero(WINDOW_SIZE) },
            const { non_zero(STEP_SIZE) },
        )
        .with_window(&HannWindow);
        let magnitudes = vec![0.; stft.output_size()];

        Self {
            stft,
            sample_rate,
            magnitudes,
            frame_start: 0,
        }
    }

    /// Feeds `signal` and returns a [`PitchFrame`] for every complete frame.
    ///
    /// Samples that do not fill a frame are kept for the next call.
    pub fn track(&mut self, signal: &[f32]) -> Vec<PitchFrame> {
        self.stft.append_samples(signal);

        let bin_width = self.stft.bin_width(self.sample_rate);
        let half_window = self.stft.window_size() / 2;
        let mut frames = Vec::new();

        while self.stft.contains_enough_to_compute() {
            self.stft.compute_magnitudes(&mut self.magnitudes);
            frames.push(PitchFrame {
                t: (self.frame_start + half_window) as f64 / self.sample_rate as f64,
                hz: dominant_frequency(&self.magnitudes, bin_width),
            });
            self.stft.move_to_next_column();
            self.frame_start += self.stft.step_size();
        }

        frames
    }
}

/// Finds the peak of a magnitude spectrum and refines it between bins.
///
/// Fits a parabola through the log magnitudes of the peak bin and its
/// neighbours. Returns `0.0` for an empty or silent spectrum.
pub fn dominant_frequency(magnitudes: &[f32], bin_width: f64) -> f64 {
    let Some((peak, &level)) = magnitudes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
    else {
        return 0.0;
    };
    if level <= 0.0 {
        return 0.0;
    }
    if peak == 0 || peak + 1 == magnitudes.len() {
        return peak as f64 * bin_width;
    }

    let log = |bin: usize| (magnitudes[bin].max(f32::MIN_POSITIVE) as f64).ln();
    let (left, center, right) = (log(peak - 1), log(peak), log(peak + 1));
    let curvature = left - 2.0 * center + right;
    let offset = if curvature < 0.0 {
        0.5 * (left - right) / curvature
    } else {
        0.0
    };

    (peak as f64 + offset) * bin_width
}
