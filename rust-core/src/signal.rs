//! Value types crossing the engine boundary
//!
//! A `Signal` is what the data-loading side hands in, a `Spectrum` is what
//! the estimators hand back. Both are validated on construction and never
//! mutated afterwards.

use crate::error::{validate_sample_rate, validate_samples, PsdError, Result};
use crate::spectrum::db::to_db;
use crate::spectrum::rms::rms_from_psd;

/// Validated 1-D time series
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: f64,
    start_time: f64,
}

impl Signal {
    /// Create a signal starting at t = 0
    ///
    /// Fails if `samples` is empty or contains NaN/Inf, or if `sample_rate`
    /// is not strictly positive.
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        validate_samples(&samples)?;
        Ok(Self {
            samples,
            sample_rate,
            start_time: 0.0,
        })
    }

    /// Set the time of the first sample, in seconds
    pub fn with_start_time(mut self, start_time: f64) -> Result<Self> {
        if !start_time.is_finite() {
            return Err(PsdError::invalid(
                "start_time",
                format!("must be finite (got {})", start_time),
            ));
        }
        self.start_time = start_time;
        Ok(self)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; a signal holds at least one sample
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Record duration in seconds (N / fs)
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    /// Time of every sample, in seconds
    pub fn times(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|n| self.start_time + n as f64 / self.sample_rate)
            .collect()
    }

    /// Time-domain RMS sqrt(mean(x²))
    pub fn rms(&self) -> f64 {
        time_domain_rms(&self.samples)
    }

    /// Time-domain RMS after removing the mean
    ///
    /// This is the quantity a detrended PSD integrates to.
    pub fn ac_rms(&self) -> f64 {
        ac_rms(&self.samples)
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// Time-domain RMS sqrt(mean(x²)) of a sample slice (0 for an empty slice)
pub fn time_domain_rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&x| x * x).sum::<f64>() / samples.len() as f64).sqrt()
}

/// RMS of a sample slice about its own mean (standard deviation, population)
pub fn ac_rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    (samples.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / n).sqrt()
}

/// One-sided power spectral density: frequencies in Hz, values in units²/Hz
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    values: Vec<f64>,
}

impl Spectrum {
    /// Build a spectrum from matching frequency and value sequences
    ///
    /// Frequencies must be finite and strictly increasing; values must be
    /// finite and non-negative.
    pub fn new(frequencies: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        validate_axis(&frequencies, &values)?;
        validate_psd_values(&values)?;
        Ok(Self { frequencies, values })
    }

    /// Estimators produce axes that satisfy the invariants by construction
    pub(crate) fn from_parts_unchecked(frequencies: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(frequencies.len(), values.len());
        Self { frequencies, values }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bin spacing of the axis (0 for a single-bin spectrum)
    pub fn df(&self) -> f64 {
        if self.frequencies.len() < 2 {
            return 0.0;
        }
        self.frequencies[1] - self.frequencies[0]
    }

    /// Index of the bin whose frequency is closest to `freq`
    pub fn nearest_bin(&self, freq: f64) -> Option<usize> {
        if self.frequencies.is_empty() || !freq.is_finite() {
            return None;
        }
        let idx = self.frequencies.partition_point(|&f| f < freq);
        if idx == 0 {
            return Some(0);
        }
        if idx == self.frequencies.len() {
            return Some(idx - 1);
        }
        if (self.frequencies[idx] - freq) < (freq - self.frequencies[idx - 1]) {
            Some(idx)
        } else {
            Some(idx - 1)
        }
    }

    /// Value of the bin nearest `freq`
    pub fn value_at(&self, freq: f64) -> Option<f64> {
        self.nearest_bin(freq).map(|idx| self.values[idx])
    }

    /// Frequency and value of the largest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (idx, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((idx, v)),
            })
            .map(|(idx, v)| (self.frequencies[idx], v))
    }

    /// RMS over the full axis
    pub fn rms(&self) -> Result<f64> {
        rms_from_psd(&self.frequencies, &self.values, None, None)
    }

    /// RMS over an optional `[freq_min, freq_max]` sub-range
    pub fn rms_in(&self, freq_min: Option<f64>, freq_max: Option<f64>) -> Result<f64> {
        rms_from_psd(&self.frequencies, &self.values, freq_min, freq_max)
    }

    /// Values on a 10·log10 scale relative to `reference`
    pub fn to_db(&self, reference: f64) -> Result<Vec<f64>> {
        to_db(&self.values, reference)
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.frequencies, self.values)
    }
}

/// Check that a frequency axis pairs with a value sequence
pub(crate) fn validate_axis(frequencies: &[f64], values: &[f64]) -> Result<()> {
    if frequencies.len() != values.len() {
        return Err(PsdError::invalid(
            "frequencies",
            format!(
                "length {} does not match psd_values length {}",
                frequencies.len(),
                values.len()
            ),
        ));
    }
    if frequencies.is_empty() {
        return Err(PsdError::invalid("frequencies", "must contain at least one bin"));
    }
    if frequencies.iter().any(|f| !f.is_finite()) {
        return Err(PsdError::invalid("frequencies", "must be finite"));
    }
    if frequencies.windows(2).any(|w| w[1] <= w[0]) {
        return Err(PsdError::invalid("frequencies", "must be strictly increasing"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PsdError::invalid("psd_values", "must be finite"));
    }
    Ok(())
}

/// Check that PSD values are non-negative
pub(crate) fn validate_psd_values(values: &[f64]) -> Result<()> {
    if let Some((idx, v)) = values.iter().enumerate().find(|(_, v)| **v < 0.0) {
        return Err(PsdError::invalid(
            "psd_values",
            format!("value {} must be >= 0 (got {})", idx, v),
        ));
    }
    Ok(())
}
