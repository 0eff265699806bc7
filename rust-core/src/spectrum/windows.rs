//! Window functions for spectral estimation
//!
//! Spectral windows are generated in their periodic (DFT-even) form: a
//! symmetric window of length M+1 with the last sample dropped. This is the
//! form used for averaged periodograms so that overlapping Hann segments sum
//! to a constant.

use crate::error::PsdError;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/M)
    /// Sidelobe attenuation: ~31 dB, fast rolloff
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/M)
    /// Sidelobe attenuation: ~43 dB
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/M) + 0.08*cos(4πn/M)
    /// Sidelobe attenuation: ~58 dB, widest mainlobe
    Blackman,

    /// Bartlett (triangular) window with zero endpoints
    Bartlett,

    /// Rectangular window (no windowing, "boxcar")
    Rectangular,
}

impl WindowType {
    /// All supported windows, in the order presented to users
    pub const ALL: [WindowType; 5] = [
        WindowType::Hann,
        WindowType::Hamming,
        WindowType::Blackman,
        WindowType::Bartlett,
        WindowType::Rectangular,
    ];

    /// Canonical lower-case name
    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
            WindowType::Bartlett => "bartlett",
            WindowType::Rectangular => "boxcar",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = PsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Ok(WindowType::Hann),
            "hamming" => Ok(WindowType::Hamming),
            "blackman" => Ok(WindowType::Blackman),
            "bartlett" | "triangular" => Ok(WindowType::Bartlett),
            "boxcar" | "rectangular" | "rect" | "none" => Ok(WindowType::Rectangular),
            other => Err(PsdError::invalid(
                "window_name",
                format!(
                    "unrecognized window '{}' (expected one of hann, hamming, blackman, bartlett, boxcar)",
                    other
                ),
            )),
        }
    }
}

/// Generate symmetric window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1, with w[0] == w[M-1]
pub fn generate_symmetric_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    if length == 1 {
        return vec![1.0];
    }

    let denom = (length - 1) as f64;

    (0..length)
        .map(|n| {
            let x = n as f64 / denom;
            match window_type {
                WindowType::Hann => 0.5 - 0.5 * (2.0 * PI * x).cos(),
                WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * x).cos(),
                WindowType::Blackman => {
                    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
                }
                WindowType::Bartlett => 1.0 - (2.0 * x - 1.0).abs(),
                WindowType::Rectangular => 1.0,
            }
        })
        .collect()
}

/// Generate periodic window coefficients for spectral analysis
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Segment length (M)
///
/// # Returns
/// First M coefficients of the symmetric window of length M+1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    let mut window = generate_symmetric_window(window_type, length + 1);
    window.truncate(length);
    window
}
