//! Python bindings for the spectral estimators

use pyo3::prelude::*;
use numpy::{PyArray1, PyReadonlyArray1};
use crate::error::{PsdError, Result};
use crate::spectrum::octave::OctaveFraction;
use crate::spectrum::plan::{self, overlap_from_percent, Resolution, DEFAULT_OVERLAP_PERCENT};
use crate::spectrum::maximax::{self, MaximaxParams};
use crate::spectrum::windows::WindowType;
use crate::spectrum::{db, octave, rms, welch};

/// Resolution from the two mutually exclusive keyword arguments
pub(super) fn resolution_from(desired_df: Option<f64>, segment_len: Option<usize>) -> Result<Resolution> {
    match (desired_df, segment_len) {
        (Some(df), None) => Ok(Resolution::Df(df)),
        (None, Some(len)) => Ok(Resolution::SegmentLength(len)),
        (Some(_), Some(_)) => Err(PsdError::invalid(
            "segment_len",
            "give either desired_df or segment_len, not both",
        )),
        (None, None) => Err(PsdError::invalid(
            "desired_df",
            "either desired_df or segment_len is required",
        )),
    }
}

/// Derive a segmentation plan
///
/// Args:
///     sample_rate: Sample rate in Hz
///     available_samples: Samples the plan must fit into
///     desired_df: Target frequency resolution in Hz
///     segment_len: Explicit segment length (instead of desired_df)
///     overlap_percent: Segment overlap in percent (default: 50)
///     efficient_fft: Round segment length up to a power of two
///
/// Returns:
///     Tuple of (segment_len, overlap_len, actual_df)
#[pyfunction]
#[pyo3(signature = (sample_rate, available_samples, desired_df=None, segment_len=None, overlap_percent=None, efficient_fft=false))]
pub fn plan_segments(
    sample_rate: f64,
    available_samples: usize,
    desired_df: Option<f64>,
    segment_len: Option<usize>,
    overlap_percent: Option<f64>,
    efficient_fft: bool,
) -> PyResult<(usize, usize, f64)> {
    let resolution = resolution_from(desired_df, segment_len)?;
    let plan = plan::plan(sample_rate, resolution, overlap_percent, efficient_fft, available_samples)?;
    Ok((plan.segment_len, plan.overlap_len, plan.actual_df))
}

/// Welch averaged PSD
///
/// Args:
///     signal: Input signal as numpy array
///     sample_rate: Sample rate in Hz
///     segment_len: Samples per segment
///     overlap_len: Samples shared by consecutive segments (default: segment_len // 2)
///     window: Window name (hann, hamming, blackman, bartlett, boxcar)
///
/// Returns:
///     Tuple of (frequencies, psd) numpy arrays
#[pyfunction]
#[pyo3(signature = (signal, sample_rate, segment_len, overlap_len=None, window="hann"))]
pub fn welch_psd<'py>(
    py: Python<'py>,
    signal: PyReadonlyArray1<f64>,
    sample_rate: f64,
    segment_len: usize,
    overlap_len: Option<usize>,
    window: &str,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let samples = signal.as_slice()?;
    let window_type = window.parse::<WindowType>()?;
    let overlap = match overlap_len {
        Some(len) => len,
        None => overlap_from_percent(segment_len, DEFAULT_OVERLAP_PERCENT)?,
    };

    let spectrum = py.allow_threads(|| {
        welch::welch_psd(samples, sample_rate, segment_len, overlap, window_type)
    })?;
    let (freqs, psd) = spectrum.into_parts();

    Ok((PyArray1::from_vec(py, freqs), PyArray1::from_vec(py, psd)))
}

/// Maximax envelope PSD
///
/// Args:
///     signal: Input signal as numpy array
///     sample_rate: Sample rate in Hz
///     desired_df: Frequency resolution of each window's Welch estimate
///     window_duration: Window length in seconds (default: 1.0)
///     overlap_percent: Window overlap in percent (default: 50)
///     window: Window name for the Welch segments
///     efficient_fft: Round segment length up to a power of two
///
/// Returns:
///     Tuple of (frequencies, psd) numpy arrays
#[pyfunction]
#[pyo3(signature = (signal, sample_rate, desired_df=1.0, window_duration=1.0, overlap_percent=50.0, window="hann", efficient_fft=false))]
#[allow(clippy::too_many_arguments)]
pub fn maximax_psd<'py>(
    py: Python<'py>,
    signal: PyReadonlyArray1<f64>,
    sample_rate: f64,
    desired_df: f64,
    window_duration: f64,
    overlap_percent: f64,
    window: &str,
    efficient_fft: bool,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let samples = signal.as_slice()?;
    let params = MaximaxParams {
        window_duration,
        overlap_percent,
        resolution: Resolution::Df(desired_df),
        segment_overlap_percent: None,
        window: window.parse::<WindowType>()?,
        use_efficient_fft: efficient_fft,
    };

    let result = py.allow_threads(|| maximax::maximax(samples, sample_rate, &params))?;
    let (freqs, psd) = result.spectrum.into_parts();

    Ok((PyArray1::from_vec(py, freqs), PyArray1::from_vec(py, psd)))
}

/// Reduce a narrowband PSD to fractional-octave bands
///
/// Args:
///     frequencies: Narrowband frequency axis
///     psd: Narrowband PSD values
///     fraction: Bands per octave (1, 3, 6, 12, 24 or 36)
///     freq_min: Lowest band centre in Hz (> 0)
///     freq_max: Highest band centre in Hz
///
/// Returns:
///     Tuple of (center_frequencies, band_psd) numpy arrays
#[pyfunction]
pub fn to_octave_bands<'py>(
    py: Python<'py>,
    frequencies: PyReadonlyArray1<f64>,
    psd: PyReadonlyArray1<f64>,
    fraction: u32,
    freq_min: f64,
    freq_max: f64,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let fraction = OctaveFraction::try_from(fraction)?;
    let bands = octave::to_octave_bands(
        frequencies.as_slice()?,
        psd.as_slice()?,
        fraction,
        freq_min,
        freq_max,
    )?;
    let (centers, values) = bands.into_parts();

    Ok((PyArray1::from_vec(py, centers), PyArray1::from_vec(py, values)))
}

/// RMS from a PSD by trapezoidal integration
///
/// Args:
///     frequencies: Frequency axis in Hz
///     psd: PSD values
///     freq_min: Lower integration limit (default: first bin)
///     freq_max: Upper integration limit (default: last bin)
#[pyfunction]
#[pyo3(signature = (frequencies, psd, freq_min=None, freq_max=None))]
pub fn rms_from_psd(
    frequencies: PyReadonlyArray1<f64>,
    psd: PyReadonlyArray1<f64>,
    freq_min: Option<f64>,
    freq_max: Option<f64>,
) -> PyResult<f64> {
    Ok(rms::rms_from_psd(frequencies.as_slice()?, psd.as_slice()?, freq_min, freq_max)?)
}

/// Convert PSD values to dB, clamping zeros to a finite floor
///
/// Args:
///     psd: PSD values
///     reference: Reference level for 0 dB (default: 1.0)
#[pyfunction]
#[pyo3(signature = (psd, reference=1.0))]
pub fn to_db<'py>(
    py: Python<'py>,
    psd: PyReadonlyArray1<f64>,
    reference: f64,
) -> PyResult<&'py PyArray1<f64>> {
    let values = db::to_db(psd.as_slice()?, reference)?;
    Ok(PyArray1::from_vec(py, values))
}

/// Names of the supported window functions
#[pyfunction]
pub fn window_names() -> Vec<&'static str> {
    WindowType::ALL.iter().map(|w| w.name()).collect()
}
