//! Welch averaged-periodogram PSD estimator
//!
//! Segments of `segment_len` samples hop by `segment_len - overlap_len`; a
//! trailing partial segment is dropped. Every segment is detrended against
//! its own mean, windowed, transformed, and scaled by 1 / (fs · sum(w²)).
//! The one-sided periodograms are averaged bin by bin. With this scaling the
//! integral of the PSD equals the (detrended) signal variance.

use super::fft::FftEngine;
use super::plan::{validate_segmentation, SegmentPlan};
use super::windowing::{prepare_segment, window_energy};
use super::windows::{generate_window, WindowType};
use crate::error::{validate_sample_rate, validate_samples, PsdError, Result};
use crate::signal::Spectrum;
use log::debug;

/// Reusable Welch estimator for one segmentation and window
///
/// Holds the window coefficients and a planned FFT so repeated estimates
/// (the maximax windows) share a single frequency axis.
#[derive(Debug, Clone)]
pub struct WelchEstimator {
    sample_rate: f64,
    plan: SegmentPlan,
    window_type: WindowType,
    window: Vec<f64>,
    scale: f64,
    fft_engine: FftEngine,
    segment_buffer: Vec<f64>,
    power_buffer: Vec<f64>,
}

impl WelchEstimator {
    /// Create an estimator
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `segment_len` - Samples per segment (FFT length)
    /// * `overlap_len` - Samples shared by consecutive segments
    /// * `window_type` - Window applied to each detrended segment
    pub fn new(
        sample_rate: f64,
        segment_len: usize,
        overlap_len: usize,
        window_type: WindowType,
    ) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        // Available-sample check happens per estimate
        validate_segmentation(segment_len, overlap_len, segment_len)?;

        let window = generate_window(window_type, segment_len);
        let energy = window_energy(&window);
        if energy <= 0.0 {
            return Err(PsdError::invalid(
                "segment_len",
                format!(
                    "{} window of {} samples has zero energy",
                    window_type, segment_len
                ),
            ));
        }

        let fft_engine = FftEngine::new(segment_len);
        let power_buffer = vec![0.0; fft_engine.num_bins()];

        Ok(Self {
            sample_rate,
            plan: SegmentPlan {
                segment_len,
                overlap_len,
                actual_df: sample_rate / segment_len as f64,
            },
            window_type,
            window,
            scale: 1.0 / (sample_rate * energy),
            fft_engine,
            segment_buffer: vec![0.0; segment_len],
            power_buffer,
        })
    }

    /// Create an estimator from a segmentation plan
    pub fn from_plan(sample_rate: f64, plan: &SegmentPlan, window_type: WindowType) -> Result<Self> {
        Self::new(sample_rate, plan.segment_len, plan.overlap_len, window_type)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn segment_len(&self) -> usize {
        self.plan.segment_len
    }

    pub fn overlap_len(&self) -> usize {
        self.plan.overlap_len
    }

    /// Segmentation this estimator runs with
    pub fn plan(&self) -> &SegmentPlan {
        &self.plan
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Number of output bins (segment_len/2 + 1)
    pub fn num_bins(&self) -> usize {
        self.fft_engine.num_bins()
    }

    /// Bin spacing fs / segment_len
    pub fn df(&self) -> f64 {
        self.plan.actual_df
    }

    /// One-sided frequency axis shared by every estimate from this estimator
    pub fn frequencies(&self) -> Vec<f64> {
        self.fft_engine.frequency_axis_hz(self.sample_rate)
    }

    /// Number of whole segments in `available` samples
    pub fn segment_count(&self, available: usize) -> usize {
        self.plan.segment_count(available)
    }

    /// Estimate the PSD of `samples`
    ///
    /// Fails if `samples` is empty, holds NaN/Inf, or is shorter than one
    /// segment.
    pub fn estimate(&mut self, samples: &[f64]) -> Result<Spectrum> {
        let values = self.estimate_values(samples)?;
        Ok(Spectrum::from_parts_unchecked(self.frequencies(), values))
    }

    /// Estimate the PSD values only, on the axis given by `frequencies()`
    pub fn estimate_values(&mut self, samples: &[f64]) -> Result<Vec<f64>> {
        validate_samples(samples)?;
        self.estimate_values_unchecked(samples)
    }

    /// `estimate_values` for samples the caller has already validated
    pub(crate) fn estimate_values_unchecked(&mut self, samples: &[f64]) -> Result<Vec<f64>> {
        let segment_len = self.plan.segment_len;
        if samples.len() < segment_len {
            return Err(PsdError::invalid(
                "segment_len",
                format!(
                    "{} samples exceeds the {} samples available",
                    segment_len,
                    samples.len()
                ),
            ));
        }

        let stride = self.plan.stride();
        let num_segments = self.plan.segment_count(samples.len());
        let mut accum = vec![0.0; self.num_bins()];

        for start in (0..num_segments).map(|i| i * stride) {
            let segment = &samples[start..start + segment_len];
            prepare_segment(segment, &self.window, &mut self.segment_buffer);
            self.fft_engine
                .compute_power_into(&self.segment_buffer, &mut self.power_buffer)?;

            for (acc, &p) in accum.iter_mut().zip(self.power_buffer.iter()) {
                *acc += p;
            }
        }

        // Density scaling, averaged over segments
        let norm = self.scale / num_segments as f64;
        for acc in accum.iter_mut() {
            *acc *= norm;
        }
        fold_one_sided(&mut accum, segment_len);

        Ok(accum)
    }
}

/// Double every bin except DC and, for even lengths, Nyquist
///
/// Folds the energy of the negative frequencies into the one-sided PSD.
fn fold_one_sided(psd: &mut [f64], segment_len: usize) {
    let last = if segment_len % 2 == 0 {
        psd.len().saturating_sub(1)
    } else {
        psd.len()
    };
    for v in psd.iter_mut().take(last).skip(1) {
        *v *= 2.0;
    }
}

/// Welch PSD of a sample slice
///
/// # Arguments
/// * `samples` - Time series (finite, at least `segment_len` long)
/// * `sample_rate` - Sample rate in Hz
/// * `segment_len` - Samples per segment
/// * `overlap_len` - Samples shared by consecutive segments
/// * `window_type` - Window applied to each segment
///
/// # Returns
/// One-sided PSD in units²/Hz on the axis k·fs/segment_len
pub fn welch_psd(
    samples: &[f64],
    sample_rate: f64,
    segment_len: usize,
    overlap_len: usize,
    window_type: WindowType,
) -> Result<Spectrum> {
    validate_sample_rate(sample_rate)?;
    validate_samples(samples)?;
    validate_segmentation(segment_len, overlap_len, samples.len())?;

    let mut estimator = WelchEstimator::new(sample_rate, segment_len, overlap_len, window_type)?;
    debug!(
        "Welch PSD: {} samples, segment_len={}, overlap_len={}, window={}, {} segments",
        samples.len(),
        segment_len,
        overlap_len,
        window_type,
        estimator.segment_count(samples.len())
    );
    let values = estimator.estimate_values_unchecked(samples)?;
    Ok(Spectrum::from_parts_unchecked(estimator.frequencies(), values))
}

/// Welch PSD with the window given by name ("hann", "hamming", "blackman",
/// "bartlett" or "boxcar")
pub fn welch_psd_named(
    samples: &[f64],
    sample_rate: f64,
    segment_len: usize,
    overlap_len: usize,
    window_name: &str,
) -> Result<Spectrum> {
    let window_type = window_name.parse::<WindowType>()?;
    welch_psd(samples, sample_rate, segment_len, overlap_len, window_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, amplitude: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    fn variance(samples: &[f64]) -> f64 {
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn test_output_axis() {
        let signal = sine(50.0, 1.0, 1000.0, 10_000);
        let psd = welch_psd(&signal, 1000.0, 1000, 500, WindowType::Hann).unwrap();

        assert_eq!(psd.len(), 501);
        assert_eq!(psd.frequencies()[0], 0.0);
        assert!((psd.frequencies()[500] - 500.0).abs() < 1e-10);
        assert!(psd.values().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_odd_segment_axis() {
        let signal = sine(10.0, 1.0, 100.0, 1000);
        let psd = welch_psd(&signal, 100.0, 99, 49, WindowType::Hann).unwrap();

        assert_eq!(psd.len(), 50);
        assert!(psd.frequencies()[49] < 50.0);
    }

    #[test]
    fn test_peak_at_tone() {
        let fs = 1000.0;
        let signal = sine(50.0, 1.0, fs, 10_000);
        let psd = welch_psd(&signal, fs, 1000, 500, WindowType::Hann).unwrap();

        let (peak_freq, _) = psd.peak().unwrap();
        assert!((peak_freq - 50.0).abs() <= 1.0);
    }

    #[test]
    fn test_integral_equals_variance() {
        // Density scaling: sum(psd) * df == mean detrended windowed power
        let fs = 512.0;
        let signal: Vec<f64> = (0..4096)
            .map(|i| {
                let t = i as f64 / fs;
                (2.0 * PI * 32.0 * t).sin() + 0.5 * (2.0 * PI * 100.0 * t).cos()
            })
            .collect();

        for window in WindowType::ALL {
            let psd = welch_psd(&signal, fs, 512, 256, window).unwrap();
            let power: f64 = psd.values().iter().sum::<f64>() * psd.df();
            let expected = variance(&signal);
            assert!(
                (power - expected).abs() / expected < 0.05,
                "{}: {} vs {}",
                window,
                power,
                expected
            );
        }
    }

    #[test]
    fn test_rectangular_matches_periodogram() {
        // One rectangular segment: psd[k] = 2|X[k]|² / (fs * N) for interior bins
        let fs = 8.0;
        let signal = [1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0];
        let psd = welch_psd(&signal, fs, 8, 0, WindowType::Rectangular).unwrap();

        // Cosine at bin 2: |X[2]| = 4
        assert!((psd.values()[2] - 2.0 * 16.0 / 64.0).abs() < 1e-12);
        assert!(psd.values()[0].abs() < 1e-12);
        assert!(psd.values()[1].abs() < 1e-12);
    }

    #[test]
    fn test_constant_signal_gives_zero_psd() {
        let signal = vec![3.5; 2048];
        let psd = welch_psd(&signal, 100.0, 256, 128, WindowType::Hann).unwrap();
        assert!(psd.values().iter().all(|&v| v.is_finite() && v.abs() < 1e-20));

        let zeros = vec![0.0; 2048];
        let psd = welch_psd(&zeros, 100.0, 256, 128, WindowType::Blackman).unwrap();
        assert!(psd.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_detrend_is_per_segment() {
        // Each segment holds a different constant; per-segment detrend zeroes
        // all of them, a global detrend would not.
        let mut signal = vec![1.0; 100];
        signal.extend(vec![5.0; 100]);
        let psd = welch_psd(&signal, 100.0, 100, 0, WindowType::Hann).unwrap();
        assert!(psd.values().iter().all(|&v| v < 1e-20));
    }

    #[test]
    fn test_estimator_reuse() {
        let fs = 1000.0;
        let signal = sine(120.0, 2.0, fs, 5000);
        let mut estimator = WelchEstimator::new(fs, 500, 250, WindowType::Hamming).unwrap();

        assert_eq!(estimator.segment_count(5000), 19);
        assert!((estimator.df() - 2.0).abs() < 1e-12);

        let a = estimator.estimate(&signal).unwrap();
        let b = estimator.estimate(&signal).unwrap();
        assert_eq!(a, b);

        let direct = welch_psd(&signal, fs, 500, 250, WindowType::Hamming).unwrap();
        assert_eq!(a, direct);
    }

    #[test]
    fn test_estimator_rejects_non_finite_samples() {
        let mut estimator = WelchEstimator::new(100.0, 8, 4, WindowType::Hann).unwrap();
        let mut signal = sine(10.0, 1.0, 100.0, 32);

        signal[3] = f64::NAN;
        let err = estimator.estimate(&signal).unwrap_err();
        assert_eq!(err.parameter(), Some("signal"));

        signal[3] = f64::INFINITY;
        let err = estimator.estimate_values(&signal).unwrap_err();
        assert_eq!(err.parameter(), Some("signal"));

        assert_eq!(estimator.estimate(&[]).unwrap_err().parameter(), Some("signal"));

        // Still usable after rejecting bad input
        signal[3] = 0.0;
        let psd = estimator.estimate(&signal).unwrap();
        assert!(psd.values().iter().all(|v| v.is_finite()));
        assert!(psd.rms().is_ok());
    }

    #[test]
    fn test_estimator_plan() {
        let estimator = WelchEstimator::new(1000.0, 500, 250, WindowType::Hann).unwrap();
        let plan = estimator.plan();
        assert_eq!(plan.stride(), 250);
        assert_eq!(estimator.segment_count(5000), plan.segment_count(5000));
        assert!((plan.actual_df - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_trailing_partial_segment_dropped() {
        let fs = 100.0;
        let mut signal = sine(10.0, 1.0, fs, 300);
        let base = welch_psd(&signal, fs, 100, 50, WindowType::Hann).unwrap();

        // 40 extra samples are not enough for another segment
        signal.extend(vec![1000.0; 40]);
        let extended = welch_psd(&signal, fs, 100, 50, WindowType::Hann).unwrap();
        assert_eq!(base, extended);
    }

    #[test]
    fn test_invalid_parameters() {
        let signal = vec![0.0; 100];

        let err = welch_psd(&signal, 0.0, 10, 5, WindowType::Hann).unwrap_err();
        assert_eq!(err.parameter(), Some("sample_rate"));

        let err = welch_psd(&signal, 100.0, 200, 5, WindowType::Hann).unwrap_err();
        assert_eq!(err.parameter(), Some("segment_len"));

        let err = welch_psd(&signal, 100.0, 10, 10, WindowType::Hann).unwrap_err();
        assert_eq!(err.parameter(), Some("overlap_len"));

        let err = welch_psd_named(&signal, 100.0, 10, 5, "flattop").unwrap_err();
        assert_eq!(err.parameter(), Some("window_name"));

        let err = welch_psd(&[1.0, f64::NAN, 1.0], 100.0, 2, 1, WindowType::Hann).unwrap_err();
        assert_eq!(err.parameter(), Some("signal"));

        // A one-sample Hann window is identically zero
        let err = welch_psd(&signal, 100.0, 1, 0, WindowType::Hann).unwrap_err();
        assert_eq!(err.parameter(), Some("segment_len"));
    }
}
