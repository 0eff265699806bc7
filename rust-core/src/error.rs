//! Error taxonomy for the spectral estimation engine
//!
//! Every precondition violation is surfaced as an explicit error naming the
//! offending parameter. Degenerate-but-valid inputs (constant or all-zero
//! signals) are not errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PsdError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("FFT processing failed: {0}")]
    Fft(String),
}

impl PsdError {
    /// Shorthand for building an `InvalidParameter` error
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PsdError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Name of the parameter that failed validation, if any
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            PsdError::InvalidParameter { name, .. } => Some(name),
            PsdError::Fft(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PsdError>;

/// Check that a sample rate is finite and strictly positive
pub fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(PsdError::invalid(
            "sample_rate",
            format!("must be a finite value > 0 Hz (got {})", sample_rate),
        ));
    }
    Ok(())
}

/// Check that a sample sequence is non-empty and contains no NaN/Inf
pub fn validate_samples(samples: &[f64]) -> Result<()> {
    if samples.is_empty() {
        return Err(PsdError::invalid("signal", "must contain at least one sample"));
    }
    if let Some((idx, value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PsdError::invalid(
            "signal",
            format!("sample {} is not finite ({})", idx, value),
        ));
    }
    Ok(())
}

/// Check an optional `[freq_min, freq_max]` range
///
/// Bounds must be finite, `freq_min` must not be negative and, when both are
/// given, `freq_min < freq_max`.
pub fn validate_frequency_range(freq_min: Option<f64>, freq_max: Option<f64>) -> Result<()> {
    if let Some(lo) = freq_min {
        if !lo.is_finite() || lo < 0.0 {
            return Err(PsdError::invalid(
                "freq_min",
                format!("must be a finite value >= 0 Hz (got {})", lo),
            ));
        }
    }
    if let Some(hi) = freq_max {
        if !hi.is_finite() || hi <= 0.0 {
            return Err(PsdError::invalid(
                "freq_max",
                format!("must be a finite value > 0 Hz (got {})", hi),
            ));
        }
    }
    if let (Some(lo), Some(hi)) = (freq_min, freq_max) {
        if lo >= hi {
            return Err(PsdError::invalid(
                "freq_min",
                format!("must be below freq_max ({} >= {})", lo, hi),
            ));
        }
    }
    Ok(())
}
