//! Spectral density estimation

pub mod windows;
pub mod windowing;
pub mod fft;
pub mod plan;
pub mod welch;
pub mod maximax;
pub mod octave;
pub mod rms;
pub mod db;
pub mod analysis;

pub use windows::WindowType;
pub use fft::FftEngine;
pub use plan::{plan, Resolution, SegmentPlan};
pub use welch::{welch_psd, WelchEstimator};
pub use maximax::{maximax, maximax_psd, MaximaxParams, MaximaxSpectrum};
pub use octave::{to_octave_bands, OctaveBand, OctaveFraction, OctaveSpectrum};
pub use rms::{parseval_check, rms_from_psd, ParsevalCheck};
pub use db::to_db;
pub use analysis::{ChannelReport, PsdConfig, SpectralAnalyzer};
