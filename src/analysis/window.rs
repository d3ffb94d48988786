use num::NumCast;

/// A window function applied to each frame before the FFT.
pub trait Window<T>
where
    T: NumCast,
{
    /// Returns the `window_size` window coefficients.
    fn to_vec(&self, window_size: usize) -> Vec<T>;
}

/// A Hann window function, also known as a Raised Cosine window.
#[derive(Clone, Copy, Debug, Default)]
pub struct HannWindow;

impl<T> Window<T> for HannWindow
where
    T: NumCast,
{
    fn to_vec(&self, window_size: usize) -> Vec<T> {
        cast_all(apodize::hanning_iter(window_size))
    }
}

fn cast_all<T: NumCast>(coefficients: impl Iterator<Item = f64>) -> Vec<T> {
    // Window coefficients lie in [0, 1], which every float type can hold.
    coefficients
        .map(|w| T::from(w).unwrap_or_else(|| unreachable!("window coefficient {w} out of range")))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn hann_apodization() {
        // Note: Test case migrated from apodize crate.
        let window: Vec<f32> = HannWindow.to_vec(7);
        let expected = vec![
            0.0,
            0.24999999999999994,
            0.7499999999999999,
            1.0,
            0.7500000000000002,
            0.25,
            0.0,
        ];
        assert_ulps_eq!(window.as_slice(), expected.as_slice(), max_ulps = 10);
    }

    #[test]
    fn hann_is_symmetric() {
        let window: Vec<f64> = HannWindow.to_vec(64);
        for (a, b) in window.iter().zip(window.iter().rev()) {
            assert_ulps_eq!(a, b, epsilon = 1e-12);
        }
    }
}
