//! RMS from PSD and the Parseval self-check
//!
//! The PSD is integrated with the trapezoidal rule on its own frequency axis.
//! Range limits that fall between bins are handled by linear interpolation,
//! so a sub-range integral is exactly the area under the piecewise-linear
//! PSD between the limits.

use crate::error::{validate_frequency_range, Result};
use crate::signal::{ac_rms, validate_axis, validate_psd_values, Spectrum};
use log::warn;

/// Area under the piecewise-linear PSD between `lo` and `hi`
///
/// The axis must be strictly increasing and match `values` in length. Limits
/// are clipped to the axis; an empty overlap integrates to 0.
pub fn integrate_psd(frequencies: &[f64], values: &[f64], lo: f64, hi: f64) -> f64 {
    let n = frequencies.len().min(values.len());
    if n < 2 || hi <= lo {
        return 0.0;
    }

    // First interval whose upper end lies above `lo`
    let first = frequencies[..n].partition_point(|&f| f <= lo).saturating_sub(1);

    let mut area = 0.0;
    for i in first..n - 1 {
        let (f0, f1) = (frequencies[i], frequencies[i + 1]);
        if f0 >= hi {
            break;
        }
        let a = f0.max(lo);
        let b = f1.min(hi);
        if b <= a {
            continue;
        }
        let slope = (values[i + 1] - values[i]) / (f1 - f0);
        let va = values[i] + slope * (a - f0);
        let vb = values[i] + slope * (b - f0);
        area += 0.5 * (va + vb) * (b - a);
    }
    area
}

/// RMS of a PSD, optionally restricted to `[freq_min, freq_max]`
///
/// # Arguments
/// * `frequencies` - Strictly increasing frequency axis in Hz
/// * `psd_values` - PSD values (>= 0) in units²/Hz
/// * `freq_min` - Lower integration limit; defaults to the first bin
/// * `freq_max` - Upper integration limit; defaults to the last bin
///
/// # Returns
/// sqrt of the integrated power, >= 0
pub fn rms_from_psd(
    frequencies: &[f64],
    psd_values: &[f64],
    freq_min: Option<f64>,
    freq_max: Option<f64>,
) -> Result<f64> {
    validate_axis(frequencies, psd_values)?;
    validate_psd_values(psd_values)?;
    validate_frequency_range(freq_min, freq_max)?;

    let lo = freq_min.unwrap_or(frequencies[0]);
    let hi = freq_max.unwrap_or(frequencies[frequencies.len() - 1]);

    Ok(integrate_psd(frequencies, psd_values, lo, hi).max(0.0).sqrt())
}

/// Time-domain and PSD-derived RMS side by side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsevalCheck {
    /// RMS of the signal about its mean
    pub time_rms: f64,

    /// RMS integrated from the PSD over its full axis
    pub psd_rms: f64,

    /// |psd_rms - time_rms| / time_rms (absolute difference when time_rms is 0)
    pub relative_error: f64,
}

impl ParsevalCheck {
    /// True when the two RMS values agree within `tolerance` (e.g. 0.05 for 5%)
    pub fn is_within(&self, tolerance: f64) -> bool {
        self.relative_error <= tolerance
    }
}

/// Default tolerance for `ParsevalCheck::is_within`
pub const PARSEVAL_TOLERANCE: f64 = 0.05;

/// Compare the RMS of `spectrum` with the time-domain RMS of `samples`
///
/// The time-domain side removes the mean, matching the per-segment detrend
/// of the estimators. A disagreement well beyond a few percent points to a
/// normalization error.
pub fn parseval_check(samples: &[f64], spectrum: &Spectrum) -> Result<ParsevalCheck> {
    let time_rms = ac_rms(samples);
    let psd_rms = spectrum.rms()?;

    let relative_error = if time_rms > 0.0 {
        (psd_rms - time_rms).abs() / time_rms
    } else {
        psd_rms
    };

    let check = ParsevalCheck {
        time_rms,
        psd_rms,
        relative_error,
    };
    if !check.is_within(PARSEVAL_TOLERANCE) {
        warn!(
            "Parseval check off by {:.2}% (time RMS {:.6e}, PSD RMS {:.6e})",
            relative_error * 100.0,
            time_rms,
            psd_rms
        );
    }
    Ok(check)
}
