//! Per-channel spectral analysis
//!
//! `PsdConfig` carries every tunable the configuration panel exposes.
//! `SpectralAnalyzer` runs the data flow for one channel: segmentation plan,
//! Welch estimate, optional maximax envelope, optional octave reduction,
//! RMS and the Parseval self-check. It keeps no state besides its
//! configuration, so one analyzer can serve any number of channels and
//! threads.

use super::maximax::{maximax, MaximaxParams, MaximaxSpectrum};
use super::octave::{to_octave_bands, OctaveFraction, OctaveSpectrum};
use super::plan::{overlap_from_percent, plan, Resolution, SegmentPlan, DEFAULT_OVERLAP_PERCENT};
use super::rms::{parseval_check, ParsevalCheck};
use super::welch::welch_psd;
use super::windows::WindowType;
use crate::error::{validate_frequency_range, PsdError, Result};
use crate::signal::{Signal, Spectrum};
use log::debug;

/// Spectral analysis configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PsdConfig {
    /// Frequency resolution or explicit segment length
    pub resolution: Resolution,

    /// Window type applied to each Welch segment
    pub window: WindowType,

    /// Overlap between Welch segments in percent
    pub segment_overlap_percent: f64,

    /// Round segment lengths up to a power of two for faster FFTs
    pub use_efficient_fft: bool,

    /// Also compute the maximax envelope
    pub compute_maximax: bool,

    /// Maximax window duration in seconds
    pub maximax_window_duration: f64,

    /// Overlap between maximax windows in percent
    pub maximax_overlap_percent: f64,

    /// Reduce spectra to fractional-octave bands
    pub octave_fraction: Option<OctaveFraction>,

    /// Lower frequency limit for RMS and octave bands
    pub freq_min: Option<f64>,

    /// Upper frequency limit for RMS and octave bands
    pub freq_max: Option<f64>,

    /// Present values on a dB scale
    pub use_db_scale: bool,
}

impl Default for PsdConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::Df(1.0),
            window: WindowType::Hann,
            segment_overlap_percent: DEFAULT_OVERLAP_PERCENT,
            use_efficient_fft: false,
            compute_maximax: false,
            maximax_window_duration: 1.0,
            maximax_overlap_percent: DEFAULT_OVERLAP_PERCENT,
            octave_fraction: None,
            freq_min: None,
            freq_max: None,
            use_db_scale: false,
        }
    }
}

impl PsdConfig {
    /// Check every field that can be checked without a signal
    pub fn validate(&self) -> Result<()> {
        match self.resolution {
            Resolution::Df(df) if !df.is_finite() || df <= 0.0 => {
                return Err(PsdError::invalid(
                    "desired_df",
                    format!("must be a finite value > 0 Hz (got {})", df),
                ));
            }
            Resolution::SegmentLength(0) => {
                return Err(PsdError::invalid("segment_len", "must be at least 1 sample"));
            }
            _ => {}
        }

        overlap_from_percent(1, self.segment_overlap_percent)?;

        if !self.maximax_window_duration.is_finite() || self.maximax_window_duration <= 0.0 {
            return Err(PsdError::invalid(
                "window_duration",
                format!(
                    "must be a finite value > 0 s (got {})",
                    self.maximax_window_duration
                ),
            ));
        }
        overlap_from_percent(1, self.maximax_overlap_percent)?;

        validate_frequency_range(self.freq_min, self.freq_max)
    }

    /// Segmentation plan for `available` samples at `sample_rate`
    pub fn segment_plan(&self, sample_rate: f64, available: usize) -> Result<SegmentPlan> {
        plan(
            sample_rate,
            self.resolution,
            Some(self.segment_overlap_percent),
            self.use_efficient_fft,
            available,
        )
    }

    /// Maximax parameters derived from this configuration
    pub fn maximax_params(&self) -> MaximaxParams {
        MaximaxParams {
            window_duration: self.maximax_window_duration,
            overlap_percent: self.maximax_overlap_percent,
            resolution: self.resolution,
            segment_overlap_percent: Some(self.segment_overlap_percent),
            window: self.window,
            use_efficient_fft: self.use_efficient_fft,
        }
    }
}

/// Results for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReport {
    /// Segmentation used for the Welch estimate
    pub plan: SegmentPlan,

    /// Averaged PSD
    pub welch: Spectrum,

    /// Envelope PSD, when enabled
    pub maximax: Option<MaximaxSpectrum>,

    /// Octave reduction of the Welch PSD, when enabled
    pub welch_octave: Option<OctaveSpectrum>,

    /// Octave reduction of the maximax PSD, when both are enabled
    pub maximax_octave: Option<OctaveSpectrum>,

    /// RMS of the Welch PSD over the configured range
    pub rms: f64,

    /// RMS of the maximax PSD over the configured range
    pub maximax_rms: Option<f64>,

    /// Full-range Welch RMS against the time-domain RMS
    pub parseval: ParsevalCheck,
}

/// Stateless per-channel analyzer
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    config: PsdConfig,
}

impl SpectralAnalyzer {
    /// Create new analyzer; fails on an invalid configuration
    pub fn new(config: PsdConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Welch PSD of a signal
    pub fn welch(&self, signal: &Signal) -> Result<Spectrum> {
        let plan = self.config.segment_plan(signal.sample_rate(), signal.len())?;
        welch_psd(
            signal.samples(),
            signal.sample_rate(),
            plan.segment_len,
            plan.overlap_len,
            self.config.window,
        )
    }

    /// Maximax envelope PSD of a signal
    pub fn maximax(&self, signal: &Signal) -> Result<MaximaxSpectrum> {
        maximax(signal.samples(), signal.sample_rate(), &self.config.maximax_params())
    }

    /// Octave reduction of `spectrum`, or `None` when no fraction is configured
    ///
    /// Without explicit limits the bands span the first non-DC bin up to the
    /// last bin.
    pub fn octave(&self, spectrum: &Spectrum) -> Result<Option<OctaveSpectrum>> {
        let fraction = match self.config.octave_fraction {
            Some(fraction) => fraction,
            None => return Ok(None),
        };

        let freqs = spectrum.frequencies();
        let freq_min = match self.config.freq_min {
            Some(f) if f > 0.0 => f,
            _ => freqs.iter().copied().find(|&f| f > 0.0).ok_or_else(|| {
                PsdError::invalid("frequencies", "spectrum has no bin above 0 Hz")
            })?,
        };
        let freq_max = self.config.freq_max.unwrap_or(freqs[freqs.len() - 1]);

        to_octave_bands(freqs, spectrum.values(), fraction, freq_min, freq_max).map(Some)
    }

    /// RMS of `spectrum` over the configured range
    pub fn rms(&self, spectrum: &Spectrum) -> Result<f64> {
        spectrum.rms_in(self.config.freq_min, self.config.freq_max)
    }

    /// Values ready for display: dB re 1 when `use_db_scale`, linear otherwise
    pub fn display_values(&self, values: &[f64]) -> Result<Vec<f64>> {
        if self.config.use_db_scale {
            super::db::to_db(values, 1.0)
        } else {
            Ok(values.to_vec())
        }
    }

    /// Run the full pipeline on one channel
    pub fn analyze(&self, signal: &Signal) -> Result<ChannelReport> {
        let plan = self.config.segment_plan(signal.sample_rate(), signal.len())?;
        let welch = welch_psd(
            signal.samples(),
            signal.sample_rate(),
            plan.segment_len,
            plan.overlap_len,
            self.config.window,
        )?;

        let maximax = if self.config.compute_maximax {
            Some(self.maximax(signal)?)
        } else {
            None
        };

        let welch_octave = self.octave(&welch)?;
        let maximax_octave = match &maximax {
            Some(m) => self.octave(&m.spectrum)?,
            None => None,
        };

        let rms = self.rms(&welch)?;
        let maximax_rms = maximax.as_ref().map(|m| self.rms(&m.spectrum)).transpose()?;
        let parseval = parseval_check(signal.samples(), &welch)?;

        debug!(
            "Channel analyzed: {} samples at {} Hz, df={:.6} Hz, RMS={:.6e}, Parseval error={:.3}%",
            signal.len(),
            signal.sample_rate(),
            plan.actual_df,
            rms,
            parseval.relative_error * 100.0
        );

        Ok(ChannelReport {
            plan,
            welch,
            maximax,
            welch_octave,
            maximax_octave,
            rms,
            maximax_rms,
            parseval,
        })
    }

    /// Update configuration
    pub fn update_config(&mut self, config: PsdConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> &PsdConfig {
        &self.config
    }
}
