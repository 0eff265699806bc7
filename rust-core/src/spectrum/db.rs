//! Logarithmic display scale for PSD values

use crate::error::{PsdError, Result};

/// Floor applied before taking the logarithm (-200 dB re 1)
pub const DB_EPSILON: f64 = 1e-20;

/// Convert PSD values to dB: 10·log10(max(p, ε) / reference)
///
/// Zero and negative values clamp to `DB_EPSILON`, so the output is always
/// finite.
///
/// # Arguments
/// * `psd_values` - PSD values
/// * `reference` - Reference level for 0 dB (default: 1.0)
pub fn to_db(psd_values: &[f64], reference: f64) -> Result<Vec<f64>> {
    if !reference.is_finite() || reference <= 0.0 {
        return Err(PsdError::invalid(
            "reference",
            format!("must be a finite value > 0 (got {})", reference),
        ));
    }

    Ok(psd_values
        .iter()
        .map(|&p| {
            // f64::max ignores NaN, which therefore maps to the floor
            let p_clamped = p.max(DB_EPSILON);
            10.0 * (p_clamped / reference).log10()
        })
        .collect())
}
