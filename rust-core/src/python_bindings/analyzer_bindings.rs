//! Python bindings for the per-channel analyzer

use pyo3::prelude::*;
use pyo3::types::PyDict;
use numpy::{PyArray1, PyReadonlyArray1};
use crate::signal::Signal;
use crate::spectrum::analysis::{PsdConfig, SpectralAnalyzer};
use crate::spectrum::octave::OctaveFraction;
use crate::spectrum::windows::WindowType;
use super::spectrum_bindings::resolution_from;

/// Spectral analyzer exposed to Python
#[pyclass(name = "SpectralAnalyzer")]
pub struct PySpectralAnalyzer {
    analyzer: SpectralAnalyzer,
}

#[pymethods]
impl PySpectralAnalyzer {
    /// Create a new spectral analyzer
    ///
    /// Args:
    ///     desired_df: Frequency resolution in Hz (default: 1.0)
    ///     segment_len: Explicit segment length (instead of desired_df)
    ///     window: Window name (default: "hann")
    ///     overlap_percent: Welch segment overlap in percent
    ///     efficient_fft: Round segment length up to a power of two
    ///     maximax: Also compute the maximax envelope
    ///     maximax_window_duration: Maximax window length in seconds
    ///     maximax_overlap_percent: Maximax window overlap in percent
    ///     octave_fraction: Bands per octave, or None for narrowband output
    ///     freq_min: Lower frequency limit for RMS and octave bands
    ///     freq_max: Upper frequency limit for RMS and octave bands
    ///     use_db_scale: Return display values in dB
    #[new]
    #[pyo3(signature = (
        desired_df=None,
        segment_len=None,
        window="hann",
        overlap_percent=50.0,
        efficient_fft=false,
        maximax=false,
        maximax_window_duration=1.0,
        maximax_overlap_percent=50.0,
        octave_fraction=None,
        freq_min=None,
        freq_max=None,
        use_db_scale=false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        desired_df: Option<f64>,
        segment_len: Option<usize>,
        window: &str,
        overlap_percent: f64,
        efficient_fft: bool,
        maximax: bool,
        maximax_window_duration: f64,
        maximax_overlap_percent: f64,
        octave_fraction: Option<u32>,
        freq_min: Option<f64>,
        freq_max: Option<f64>,
        use_db_scale: bool,
    ) -> PyResult<Self> {
        let desired_df = match (desired_df, segment_len) {
            (None, None) => Some(1.0),
            (df, _) => df,
        };
        let config = PsdConfig {
            resolution: resolution_from(desired_df, segment_len)?,
            window: window.parse::<WindowType>()?,
            segment_overlap_percent: overlap_percent,
            use_efficient_fft: efficient_fft,
            compute_maximax: maximax,
            maximax_window_duration,
            maximax_overlap_percent,
            octave_fraction: octave_fraction.map(OctaveFraction::try_from).transpose()?,
            freq_min,
            freq_max,
            use_db_scale,
        };

        Ok(Self {
            analyzer: SpectralAnalyzer::new(config)?,
        })
    }

    /// Analyze one channel
    ///
    /// Args:
    ///     signal: Input signal as numpy array
    ///     sample_rate: Sample rate in Hz
    ///
    /// Returns:
    ///     Dict with frequencies, psd, rms, segment_len, actual_df,
    ///     parseval_error and, when enabled, maximax / octave entries.
    ///     Spectral values are in dB when use_db_scale is set.
    fn analyze<'py>(
        &self,
        py: Python<'py>,
        signal: PyReadonlyArray1<f64>,
        sample_rate: f64,
    ) -> PyResult<&'py PyDict> {
        let signal = Signal::new(signal.as_slice()?.to_vec(), sample_rate)?;
        let report = py.allow_threads(|| self.analyzer.analyze(&signal))?;

        let out = PyDict::new(py);
        out.set_item("frequencies", PyArray1::from_slice(py, report.welch.frequencies()))?;
        out.set_item(
            "psd",
            PyArray1::from_vec(py, self.analyzer.display_values(report.welch.values())?),
        )?;
        out.set_item("rms", report.rms)?;
        out.set_item("segment_len", report.plan.segment_len)?;
        out.set_item("actual_df", report.plan.actual_df)?;
        out.set_item("parseval_error", report.parseval.relative_error)?;

        if let Some(maximax) = &report.maximax {
            out.set_item(
                "maximax_psd",
                PyArray1::from_vec(py, self.analyzer.display_values(maximax.spectrum.values())?),
            )?;
            out.set_item("maximax_windows", maximax.window_count)?;
        }
        if let Some(rms) = report.maximax_rms {
            out.set_item("maximax_rms", rms)?;
        }
        if let Some(octave) = &report.welch_octave {
            out.set_item("octave_centers", PyArray1::from_vec(py, octave.centers()))?;
            out.set_item(
                "octave_psd",
                PyArray1::from_vec(py, self.analyzer.display_values(octave.values())?),
            )?;
        }
        if let Some(octave) = &report.maximax_octave {
            out.set_item(
                "maximax_octave_psd",
                PyArray1::from_vec(py, self.analyzer.display_values(octave.values())?),
            )?;
        }

        Ok(out)
    }

    /// Get configured window name
    fn get_window(&self) -> &'static str {
        self.analyzer.config().window.name()
    }

    /// Whether display values are in dB
    fn get_use_db_scale(&self) -> bool {
        self.analyzer.config().use_db_scale
    }
}
