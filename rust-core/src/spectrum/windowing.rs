//! Segment preparation for periodogram estimation
//!
//! Each segment is detrended against its own mean, then windowed. The window
//! energy sum(w²) is what the density normalization divides by.

/// Subtract the segment's own mean in place (constant detrend)
///
/// A constant segment becomes exactly zero.
pub fn detrend_constant_inplace(segment: &mut [f64]) {
    if segment.is_empty() {
        return;
    }
    let mean = segment.iter().sum::<f64>() / segment.len() as f64;
    for s in segment.iter_mut() {
        *s -= mean;
    }
}

/// Apply window in-place
pub fn apply_window_inplace(segment: &mut [f64], window: &[f64]) {
    for (s, w) in segment.iter_mut().zip(window.iter()) {
        *s *= w;
    }
}

/// Copy `source` into `dest`, detrend it and apply `window`
///
/// `dest`, `source` and `window` must all have the segment length.
pub fn prepare_segment(source: &[f64], window: &[f64], dest: &mut [f64]) {
    dest.copy_from_slice(source);
    detrend_constant_inplace(dest);
    apply_window_inplace(dest, window);
}

/// Window energy sum(w²), the density normalization term
pub fn window_energy(window: &[f64]) -> f64 {
    window.iter().map(|&w| w * w).sum()
}
