use super::window::Window;
use num::traits::{Float, Zero};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftNum, FftPlanner};
use std::num::NonZeroUsize;
use std::sync::Arc;
use strider::{SliceRing, SliceRingImpl};

/// An implementation of the Short-Time (Fast) Fourier Transform.
pub struct ShortTimeFourierTransform<T>
where
    T: FftNum + Float,
{
    /// The size of the FFT, in time steps.
    fft_size: NonZeroUsize,
    /// The size of the time window, in time steps.
    window_size: NonZeroUsize,
    /// The number of time steps by which the time window
    /// will be shifted.
    step_size: NonZeroUsize,
    fft: Arc<dyn Fft<T>>,
    /// The internal ring buffer used to store samples.
    samples: SliceRingImpl<T>,
    /// The samples of the current frame, windowed in place.
    frame: Vec<T>,
    /// The FFT's complex input/output buffer, zero-padded beyond the frame.
    spectrum: Vec<Complex<T>>,
    /// The FFT's scratch buffer.
    scratch: Vec<Complex<T>>,
    /// The window to apply; empty for a rectangular window.
    window: Vec<T>,
}

impl<T> ShortTimeFourierTransform<T>
where
    T: FftNum + Float,
{
    /// Initializes a new [`ShortTimeFourierTransform`] instance.
    ///
    /// # Arguments
    /// * `fft_size` - The width of the FFT, in time steps. Frames are zero-padded to this size.
    /// * `window_size` - The size of the data window, in time steps.
    /// * `step_size` - The number of time steps by which the window is shifted;
    ///   clamped to `1..=window_size`.
    ///
    /// # Panics
    /// Panics when `window_size > fft_size`.
    pub fn new(fft_size: NonZeroUsize, window_size: NonZeroUsize, step_size: NonZeroUsize) -> Self {
        assert!(window_size <= fft_size, "window must fit into the FFT");
        let fft = FftPlanner::new().plan_fft_forward(fft_size.get());
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            fft,
            fft_size,
            window_size,
            step_size: step_size.clamp(NonZeroUsize::MIN, window_size),
            samples: SliceRingImpl::new(),
            frame: vec![T::zero(); window_size.get()],
            spectrum: vec![Complex::<T>::zero(); fft_size.get()],
            scratch: vec![Complex::<T>::zero(); scratch_len],
            window: Vec::default(),
        }
    }

    /// Sets the window function to use.
    pub fn with_window(mut self, window: &dyn Window<T>) -> Self {
        self.window = window.to_vec(self.window_size.get());
        self
    }

    #[inline]
    pub fn step_size(&self) -> usize {
        self.step_size.get()
    }

    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size.get()
    }

    /// Appends samples to the internal buffer.
    pub fn append_samples(&mut self, input: &[T]) {
        self.samples.push_many_back(input);
    }

    /// Determines whether the internal buffer contains enough samples to compute the STFT.
    #[inline]
    pub fn contains_enough_to_compute(&self) -> bool {
        self.window_size.get() <= self.samples.len()
    }

    /// Moves on to the the next "slice" by
    /// dropping `self.step_size` samples from the internal buffer.
    pub fn move_to_next_column(&mut self) {
        self.samples.drop_many_front(self.step_size.get());
    }

    /// Determines the number of samples in the internal buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Determines whether the internal buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of non-negative frequency bins produced per frame.
    #[inline]
    pub fn output_size(&self) -> usize {
        self.fft_size.get() / 2
    }

    /// The width of one frequency bin in Hertz.
    pub fn bin_width(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.fft_size.get() as f64
    }

    /// Computes the magnitudes of the non-negative frequency bins of the current frame.
    ///
    /// # Panics
    /// Panics when `output.len() != self.output_size()` or when there are not
    /// enough samples buffered.
    pub fn compute_magnitudes(&mut self, output: &mut [T]) {
        assert_eq!(output.len(), self.output_size());
        self.compute_internal();
        for (dst, src) in output.iter_mut().zip(self.spectrum.iter()) {
            *dst = src.norm();
        }
    }

    fn compute_internal(&mut self) {
        assert!(self.contains_enough_to_compute());
        self.samples.read_many_front(&mut self.frame);

        if !self.window.is_empty() {
            for (dst, w) in self.frame.iter_mut().zip(self.window.iter()) {
                *dst = *dst * *w;
            }
        }

        for (dst, src) in self.spectrum.iter_mut().zip(self.frame.iter()) {
            *dst = Complex::new(*src, T::zero());
        }
        for dst in self.spectrum.iter_mut().skip(self.frame.len()) {
            *dst = Complex::zero();
        }

        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::analysis::window::HannWindow;
    use approx::assert_relative_eq;

    fn stft(fft: usize, window: usize, step: usize) -> ShortTimeFourierTransform<f64> {
        ShortTimeFourierTransform::new(
            NonZeroUsize::new(fft).unwrap(),
            NonZeroUsize::new(window).unwrap(),
            NonZeroUsize::new(step).unwrap(),
        )
    }

    #[test]
    fn output_size_is_half_of_fft_size() {
        assert_eq!(stft(32, 8, 4).output_size(), 16);
    }

    #[test]
    fn step_is_clamped_to_window() {
        assert_eq!(stft(16, 8, 12).step_size(), 8);
    }

    #[test]
    fn buffer_length_is_computed_correctly() {
        let mut stft = stft(8, 8, 4);

        assert!(!stft.contains_enough_to_compute());
        assert!(stft.is_empty());

        stft.append_samples(&[500., 0., 100.]);
        assert_eq!(stft.len(), 3);
        assert!(!stft.contains_enough_to_compute());

        stft.append_samples(&[500., 0., 100., 0., 500.]);
        assert_eq!(stft.len(), 8);
        assert!(stft.contains_enough_to_compute());

        stft.move_to_next_column();
        assert_eq!(stft.len(), 4);
        assert!(!stft.contains_enough_to_compute());
    }

    #[test]
    fn compute_magnitude_no_windowing() {
        let mut stft = stft(8, 8, 4);
        stft.append_samples(&[500., 0., 100., 500., 0., 100., 0., 500.]);

        let mut output = vec![0.; stft.output_size()];
        stft.compute_magnitudes(&mut output);
        let expected = [1700.0, 430.2873298827358, 984.8857801796105, 595.6952356216941];
        assert_relative_eq!(output.as_slice(), expected.as_slice(), max_relative = 1e-9);

        // Repeat the calculation to ensure results are independent of the internal buffer.
        let mut again = vec![0.; stft.output_size()];
        stft.compute_magnitudes(&mut again);
        assert_relative_eq!(output.as_slice(), again.as_slice());
    }

    #[test]
    fn pure_tone_peaks_in_its_bin() {
        // Bin 8 of a 64-point FFT at 64 Hz sits at 8 Hz.
        let signal: Vec<f64> = (0..64)
            .map(|i| (std::f64::consts::TAU * 8.0 * i as f64 / 64.0).sin())
            .collect();
        let mut stft = stft(64, 64, 16).with_window(&HannWindow);
        stft.append_samples(&signal);

        let mut output = vec![0.; stft.output_size()];
        stft.compute_magnitudes(&mut output);
        let peak = output
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(bin, _)| bin)
            .unwrap();
        assert_eq!(peak, 8);
        assert_relative_eq!(stft.bin_width(64), 1.0);
    }
}
