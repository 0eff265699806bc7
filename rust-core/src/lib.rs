//! Vibration PSD - Spectral Density Estimation Core
//! 
//! Welch and maximax PSD estimation, fractional-octave reduction and
//! RMS integration for vibration test data, with optional Python bindings.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod error;
pub mod signal;
pub mod spectrum;
pub mod batch;
#[cfg(feature = "python")]
pub mod python_bindings;

pub use error::{PsdError, Result};
pub use signal::{Signal, Spectrum};
pub use spectrum::{
    maximax_psd, rms_from_psd, to_db, to_octave_bands, welch_psd, OctaveFraction, PsdConfig,
    Resolution, SpectralAnalyzer, WindowType,
};
