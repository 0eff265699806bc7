//! Fractional-octave band reduction
//!
//! Band centres are base-2 multiples of 1 kHz, f_c = 1000 · 2^(n/b), with band
//! edges at f_c · 2^(±1/2b). Adjacent bands share edges, so the bands tile
//! the frequency axis without gaps.
//!
//! Each band value is the narrowband PSD integrated across the band and
//! divided by the bandwidth, i.e. the mean density in the band. Summing
//! value × bandwidth over all bands gives back the narrowband power over the
//! same range.
//!
//! Edge policy: band edges that fall outside the narrowband axis are clipped
//! to it, and the clipped band reports its clipped bandwidth. A band with no
//! overlap at all is omitted.

use super::db::to_db;
use super::rms::integrate_psd;
use crate::error::{validate_frequency_range, PsdError, Result};
use crate::signal::{validate_axis, validate_psd_values};
use log::debug;
use std::fmt;

/// Reference frequency all band centres are derived from
pub const REFERENCE_FREQUENCY: f64 = 1000.0;

/// Supported fractional-octave denominators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OctaveFraction {
    Full,
    Third,
    Sixth,
    Twelfth,
    TwentyFourth,
    ThirtySixth,
}

impl OctaveFraction {
    pub const ALL: [OctaveFraction; 6] = [
        OctaveFraction::Full,
        OctaveFraction::Third,
        OctaveFraction::Sixth,
        OctaveFraction::Twelfth,
        OctaveFraction::TwentyFourth,
        OctaveFraction::ThirtySixth,
    ];

    /// Bands per octave (b in 1/b octave)
    pub fn denominator(&self) -> u32 {
        match self {
            OctaveFraction::Full => 1,
            OctaveFraction::Third => 3,
            OctaveFraction::Sixth => 6,
            OctaveFraction::Twelfth => 12,
            OctaveFraction::TwentyFourth => 24,
            OctaveFraction::ThirtySixth => 36,
        }
    }

    /// Ratio between a band's upper and lower edge, 2^(1/b)
    pub fn edge_ratio(&self) -> f64 {
        2f64.powf(1.0 / self.denominator() as f64)
    }
}

impl TryFrom<u32> for OctaveFraction {
    type Error = PsdError;

    fn try_from(denominator: u32) -> Result<Self> {
        match denominator {
            1 => Ok(OctaveFraction::Full),
            3 => Ok(OctaveFraction::Third),
            6 => Ok(OctaveFraction::Sixth),
            12 => Ok(OctaveFraction::Twelfth),
            24 => Ok(OctaveFraction::TwentyFourth),
            36 => Ok(OctaveFraction::ThirtySixth),
            other => Err(PsdError::invalid(
                "octave_fraction",
                format!("1/{} octave is not supported (expected 1, 3, 6, 12, 24 or 36)", other),
            )),
        }
    }
}

impl fmt::Display for OctaveFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{} octave", self.denominator())
    }
}

/// One fractional-octave band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveBand {
    pub center: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OctaveBand {
    /// Band with nominal edges f_c · 2^(±1/2b)
    pub fn nominal(center: f64, fraction: OctaveFraction) -> Self {
        let half = fraction.edge_ratio().sqrt();
        Self {
            center,
            lower: center / half,
            upper: center * half,
        }
    }

    pub fn bandwidth(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Nominal bands whose centres lie in `[freq_min, freq_max]`
///
/// `freq_min` must be > 0.
pub fn octave_bands(fraction: OctaveFraction, freq_min: f64, freq_max: f64) -> Result<Vec<OctaveBand>> {
    validate_frequency_range(Some(freq_min), Some(freq_max))?;
    if freq_min <= 0.0 {
        return Err(PsdError::invalid(
            "freq_min",
            "must be > 0 Hz for fractional-octave bands",
        ));
    }

    let b = fraction.denominator() as f64;
    // Tolerance keeps exact centres (e.g. 1000 Hz) inside the range
    let n_lo = (b * (freq_min / REFERENCE_FREQUENCY).log2() - 1e-9).ceil() as i64;
    let n_hi = (b * (freq_max / REFERENCE_FREQUENCY).log2() + 1e-9).floor() as i64;

    Ok((n_lo..=n_hi)
        .map(|n| {
            let center = REFERENCE_FREQUENCY * 2f64.powf(n as f64 / b);
            OctaveBand::nominal(center, fraction)
        })
        .collect())
}

/// Band-averaged PSD
#[derive(Debug, Clone, PartialEq)]
pub struct OctaveSpectrum {
    fraction: OctaveFraction,
    bands: Vec<OctaveBand>,
    values: Vec<f64>,
}

impl OctaveSpectrum {
    pub fn fraction(&self) -> OctaveFraction {
        self.fraction
    }

    /// Bands with edges after clipping to the narrowband axis
    pub fn bands(&self) -> &[OctaveBand] {
        &self.bands
    }

    /// Mean PSD in each band, units²/Hz
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn centers(&self) -> Vec<f64> {
        self.bands.iter().map(|b| b.center).collect()
    }

    pub fn bandwidths(&self) -> Vec<f64> {
        self.bands.iter().map(|b| b.bandwidth()).collect()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// RMS over all bands: sqrt(Σ value × bandwidth)
    pub fn rms(&self) -> f64 {
        self.bands
            .iter()
            .zip(self.values.iter())
            .map(|(band, &v)| v * band.bandwidth())
            .sum::<f64>()
            .max(0.0)
            .sqrt()
    }

    /// Band values on a 10·log10 scale relative to `reference`
    pub fn to_db(&self, reference: f64) -> Result<Vec<f64>> {
        to_db(&self.values, reference)
    }

    /// Centre frequencies and band values
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.bands.iter().map(|b| b.center).collect(), self.values)
    }
}

/// Reduce a narrowband PSD to fractional-octave bands
///
/// # Arguments
/// * `frequencies` - Narrowband frequency axis (strictly increasing)
/// * `psd_values` - Narrowband PSD, units²/Hz
/// * `fraction` - Bands per octave
/// * `freq_min` - Lowest band centre to include (> 0)
/// * `freq_max` - Highest band centre to include
pub fn to_octave_bands(
    frequencies: &[f64],
    psd_values: &[f64],
    fraction: OctaveFraction,
    freq_min: f64,
    freq_max: f64,
) -> Result<OctaveSpectrum> {
    validate_axis(frequencies, psd_values)?;
    validate_psd_values(psd_values)?;
    if frequencies.len() < 2 {
        return Err(PsdError::invalid(
            "frequencies",
            "need at least two bins to integrate over",
        ));
    }

    let nominal = octave_bands(fraction, freq_min, freq_max)?;
    let available_lo = frequencies[0];
    let available_hi = frequencies[frequencies.len() - 1];

    let mut bands = Vec::with_capacity(nominal.len());
    let mut values = Vec::with_capacity(nominal.len());

    for band in &nominal {
        let lower = band.lower.max(available_lo);
        let upper = band.upper.min(available_hi);
        if upper <= lower {
            continue;
        }
        let clipped = OctaveBand {
            center: band.center,
            lower,
            upper,
        };
        let power = integrate_psd(frequencies, psd_values, lower, upper);
        values.push(power / clipped.bandwidth());
        bands.push(clipped);
    }

    let omitted = nominal.len() - bands.len();
    if omitted > 0 {
        debug!(
            "{}: omitted {} of {} bands outside {:.3}..{:.3} Hz",
            fraction,
            omitted,
            nominal.len(),
            available_lo,
            available_hi
        );
    }

    if bands.is_empty() {
        return Err(PsdError::invalid(
            "freq_min",
            format!(
                "no {} band between {} and {} Hz overlaps the spectrum ({}..{} Hz)",
                fraction, freq_min, freq_max, available_lo, available_hi
            ),
        ));
    }

    Ok(OctaveSpectrum {
        fraction,
        bands,
        values,
    })
}
