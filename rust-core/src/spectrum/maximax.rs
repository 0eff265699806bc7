//! Maximax envelope PSD
//!
//! The record is cut into windows of fixed wall-clock duration. A complete
//! Welch PSD is computed for every window with one shared segmentation plan,
//! and the envelope keeps the largest value seen in each frequency bin.
//! Transient content that an average over the whole record would smear out
//! stays visible in the envelope.
//!
//! Windows start every `window_len - overlap` samples. When that stride
//! leaves samples uncovered at the end of the record, one extra window is
//! aligned to the last sample.
//!
//! Segments near the record edges fall into fewer windows than those in the
//! middle, so the window maxima alone can dip below the full-record average
//! in bins dominated by leakage. The full-record Welch estimate on the same
//! plan is folded into the envelope, which keeps it at or above the average
//! in every bin.

use super::plan::{overlap_from_percent, plan, Resolution, SegmentPlan};
use super::welch::WelchEstimator;
use super::windows::WindowType;
use crate::error::{validate_sample_rate, validate_samples, PsdError, Result};
use crate::signal::Spectrum;
use log::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Maximax parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MaximaxParams {
    /// Window duration in seconds
    pub window_duration: f64,

    /// Overlap between consecutive windows in percent
    pub overlap_percent: f64,

    /// Resolution of the per-window Welch estimates
    pub resolution: Resolution,

    /// Overlap of the Welch sub-segments inside a window; `None` means 50%
    pub segment_overlap_percent: Option<f64>,

    /// Window function for the Welch sub-segments
    pub window: WindowType,

    /// Round the sub-segment length up to a power of two
    pub use_efficient_fft: bool,
}

impl Default for MaximaxParams {
    fn default() -> Self {
        Self {
            window_duration: 1.0,
            overlap_percent: 50.0,
            resolution: Resolution::Df(1.0),
            segment_overlap_percent: None,
            window: WindowType::Hann,
            use_efficient_fft: false,
        }
    }
}

/// Envelope PSD with the layout it was computed over
#[derive(Debug, Clone, PartialEq)]
pub struct MaximaxSpectrum {
    /// Per-bin maximum across all window PSDs
    pub spectrum: Spectrum,

    /// Number of windows the envelope was taken over
    pub window_count: usize,

    /// Samples per window
    pub window_len: usize,

    /// Welch segmentation shared by every window
    pub segment_plan: SegmentPlan,
}

/// Start index of every maximax window
///
/// Regular starts hop by `window_len - overlap_len`; a final end-aligned
/// window is added when the regular layout stops short of the last sample.
pub fn window_starts(total: usize, window_len: usize, overlap_len: usize) -> Result<Vec<usize>> {
    if window_len == 0 {
        return Err(PsdError::invalid("window_duration", "must span at least one sample"));
    }
    if overlap_len >= window_len {
        return Err(PsdError::invalid(
            "overlap_percent",
            format!(
                "window overlap of {} samples leaves no stride in a {}-sample window",
                overlap_len, window_len
            ),
        ));
    }
    if window_len > total {
        return Err(PsdError::invalid(
            "window_duration",
            format!(
                "maximax window of {} samples is longer than the {}-sample signal",
                window_len, total
            ),
        ));
    }

    let stride = window_len - overlap_len;
    let mut starts: Vec<usize> = (0..=(total - window_len) / stride).map(|i| i * stride).collect();

    if let Some(&last) = starts.last() {
        if last + window_len < total {
            starts.push(total - window_len);
        }
    }
    Ok(starts)
}

/// Maximax envelope PSD with full layout information
pub fn maximax(samples: &[f64], sample_rate: f64, params: &MaximaxParams) -> Result<MaximaxSpectrum> {
    validate_sample_rate(sample_rate)?;
    validate_samples(samples)?;

    if !params.window_duration.is_finite() || params.window_duration <= 0.0 {
        return Err(PsdError::invalid(
            "window_duration",
            format!("must be a finite value > 0 s (got {})", params.window_duration),
        ));
    }

    let duration = samples.len() as f64 / sample_rate;
    let window_len = (params.window_duration * sample_rate).round() as usize;
    if window_len > samples.len() {
        return Err(PsdError::invalid(
            "window_duration",
            format!(
                "{} s window is longer than the {} s signal",
                params.window_duration, duration
            ),
        ));
    }

    let overlap_len = overlap_from_percent(window_len, params.overlap_percent)?;
    let starts = window_starts(samples.len(), window_len, overlap_len)?;

    // One plan for every window keeps the frequency axes identical
    let segment_plan = plan(
        sample_rate,
        params.resolution,
        params.segment_overlap_percent,
        params.use_efficient_fft,
        window_len,
    )?;
    let estimator = WelchEstimator::from_plan(sample_rate, &segment_plan, params.window)?;

    debug!(
        "Maximax PSD: {} windows of {} samples ({} overlap), segment_len={}, actual_df={:.6} Hz",
        starts.len(),
        window_len,
        overlap_len,
        segment_plan.segment_len,
        segment_plan.actual_df
    );

    let mut envelope = envelope_over_windows(samples, &starts, window_len, &estimator)?;
    let overall = estimator.clone().estimate_values_unchecked(samples)?;
    max_into(&mut envelope, &overall);

    Ok(MaximaxSpectrum {
        spectrum: Spectrum::from_parts_unchecked(estimator.frequencies(), envelope),
        window_count: starts.len(),
        window_len,
        segment_plan,
    })
}

#[cfg(feature = "parallel")]
fn envelope_over_windows(
    samples: &[f64],
    starts: &[usize],
    window_len: usize,
    estimator: &WelchEstimator,
) -> Result<Vec<f64>> {
    let num_bins = estimator.num_bins();

    starts
        .par_iter()
        .try_fold(
            || (estimator.clone(), vec![0.0; num_bins]),
            |(mut est, mut envelope), &start| {
                trace!("Maximax window at sample {}", start);
                let psd = est.estimate_values_unchecked(&samples[start..start + window_len])?;
                max_into(&mut envelope, &psd);
                Ok::<_, PsdError>((est, envelope))
            },
        )
        .map(|partial| partial.map(|(_, envelope)| envelope))
        .try_reduce(
            || vec![0.0; num_bins],
            |mut a, b| {
                max_into(&mut a, &b);
                Ok(a)
            },
        )
}

#[cfg(not(feature = "parallel"))]
fn envelope_over_windows(
    samples: &[f64],
    starts: &[usize],
    window_len: usize,
    estimator: &WelchEstimator,
) -> Result<Vec<f64>> {
    let mut est = estimator.clone();
    let mut envelope = vec![0.0; est.num_bins()];

    for &start in starts {
        trace!("Maximax window at sample {}", start);
        let psd = est.estimate_values_unchecked(&samples[start..start + window_len])?;
        max_into(&mut envelope, &psd);
    }
    Ok(envelope)
}

/// Element-wise running maximum
fn max_into(envelope: &mut [f64], psd: &[f64]) {
    for (e, &p) in envelope.iter_mut().zip(psd.iter()) {
        if p > *e {
            *e = p;
        }
    }
}

/// Maximax envelope PSD
///
/// # Arguments
/// * `samples` - Time series, at least one window long
/// * `sample_rate` - Sample rate in Hz
/// * `window_duration` - Window length in seconds (1.0 by convention)
/// * `overlap_percent` - Window overlap in percent (50 by convention)
/// * `desired_df` - Resolution of each window's Welch estimate
/// * `window_type` - Window function for the Welch sub-segments
pub fn maximax_psd(
    samples: &[f64],
    sample_rate: f64,
    window_duration: f64,
    overlap_percent: f64,
    desired_df: f64,
    window_type: WindowType,
) -> Result<Spectrum> {
    let params = MaximaxParams {
        window_duration,
        overlap_percent,
        resolution: Resolution::Df(desired_df),
        window: window_type,
        ..MaximaxParams::default()
    };
    maximax(samples, sample_rate, &params).map(|m| m.spectrum)
}
