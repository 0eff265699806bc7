//! FFT engine using realfft for real-valued segments
//!
//! One engine is planned per segment length and reused across every segment
//! of a Welch estimate. Buffers are owned per engine, so clones can run on
//! separate threads while sharing the planned transform.

use crate::error::{PsdError, Result};
use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer (overwritten by the transform)
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();

        Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
        }
    }

    /// Compute magnitude-squared spectrum |X[k]|² of one segment
    ///
    /// # Arguments
    /// * `segment` - Input samples (zero-padded if shorter than fft_size)
    /// * `power` - Output, one value per bin (`num_bins()` long)
    pub fn compute_power_into(&mut self, segment: &[f64], power: &mut [f64]) -> Result<()> {
        let copy_len = segment.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&segment[..copy_len]);
        if copy_len < self.fft_size {
            self.input_buffer[copy_len..].fill(0.0);
        }

        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)
            .map_err(|e| PsdError::Fft(e.to_string()))?;

        for (p, c) in power.iter_mut().zip(self.output_buffer.iter()) {
            *p = c.norm_sqr();
        }
        Ok(())
    }

    /// Compute magnitude-squared spectrum |X[k]|², allocating the output
    pub fn compute_power(&mut self, segment: &[f64]) -> Result<Vec<f64>> {
        let mut power = vec![0.0; self.num_bins()];
        self.compute_power_into(segment, &mut power)?;
        Ok(power)
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Convert bin index to frequency in Hz
    pub fn bin_to_hz(&self, bin: usize, sample_rate: f64) -> f64 {
        bin as f64 * sample_rate / self.fft_size as f64
    }

    /// One-sided frequency axis in Hz: k * fs / N for k = 0..=N/2
    ///
    /// Ends exactly at fs/2 for even N and just below it for odd N.
    pub fn frequency_axis_hz(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| self.bin_to_hz(bin, sample_rate))
            .collect()
    }
}

impl Clone for FftEngine {
    fn clone(&self) -> Self {
        Self {
            fft_size: self.fft_size,
            r2c: Arc::clone(&self.r2c),
            input_buffer: self.r2c.make_input_vec(),
            output_buffer: self.r2c.make_output_vec(),
        }
    }
}

impl std::fmt::Debug for FftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftEngine")
            .field("fft_size", &self.fft_size)
            .finish()
    }
}
