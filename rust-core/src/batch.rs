//! Multi-channel processing
//!
//! Channels are independent, so each one is analyzed on its own and the
//! results are collected in input order. With the `parallel` feature the
//! channels are spread over the rayon thread pool. A failing channel yields
//! an error in its slot and is logged; the other channels are unaffected.

use crate::error::{validate_sample_rate, validate_samples, PsdError, Result};
use crate::signal::Signal;
use crate::spectrum::analysis::{ChannelReport, PsdConfig, SpectralAnalyzer};
use crate::spectrum::welch::WelchEstimator;
use log::{debug, warn};
use ndarray::{Array2, ArrayView1, ArrayView2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Copy one channel row into a validated signal
fn row_to_signal(row: ArrayView1<f64>, sample_rate: f64) -> Result<Signal> {
    Signal::new(row.to_vec(), sample_rate)
}

fn log_failure(channel: usize, result: &Result<ChannelReport>) {
    if let Err(e) = result {
        warn!("Channel {} skipped: {}", channel, e);
    }
}

/// Analyze every row of `signals` (channels × samples) at a common sample rate
///
/// # Returns
/// One result per channel, in row order
pub fn analyze_channels(
    analyzer: &SpectralAnalyzer,
    signals: ArrayView2<f64>,
    sample_rate: f64,
) -> Vec<Result<ChannelReport>> {
    let rows: Vec<ArrayView1<f64>> = signals.rows().into_iter().collect();
    debug!(
        "Analyzing {} channels of {} samples",
        rows.len(),
        signals.ncols()
    );

    #[cfg(feature = "parallel")]
    let iter = rows.par_iter().enumerate();
    #[cfg(not(feature = "parallel"))]
    let iter = rows.iter().enumerate();

    iter.map(|(channel, row)| {
        let result = row_to_signal(row.view(), sample_rate).and_then(|s| analyzer.analyze(&s));
        log_failure(channel, &result);
        result
    })
    .collect()
}

/// Analyze independently sampled channels (lengths and rates may differ)
pub fn analyze_signals(analyzer: &SpectralAnalyzer, signals: &[Signal]) -> Vec<Result<ChannelReport>> {
    #[cfg(feature = "parallel")]
    let iter = signals.par_iter().enumerate();
    #[cfg(not(feature = "parallel"))]
    let iter = signals.iter().enumerate();

    iter.map(|(channel, signal)| {
        let result = analyzer.analyze(signal);
        log_failure(channel, &result);
        result
    })
    .collect()
}

/// Welch PSD of every row, stacked into a channels × bins matrix
///
/// All channels share one segmentation plan and therefore one frequency
/// axis. Any invalid channel fails the whole call, naming the channel.
pub fn welch_matrix(
    signals: ArrayView2<f64>,
    sample_rate: f64,
    config: &PsdConfig,
) -> Result<(Vec<f64>, Array2<f64>)> {
    config.validate()?;
    validate_sample_rate(sample_rate)?;
    if signals.nrows() == 0 {
        return Err(PsdError::invalid("signals", "must contain at least one channel"));
    }

    let plan = config.segment_plan(sample_rate, signals.ncols())?;
    let estimator = WelchEstimator::from_plan(sample_rate, &plan, config.window)?;
    let rows: Vec<ArrayView1<f64>> = signals.rows().into_iter().collect();

    let estimate_row = |est: &mut WelchEstimator,
                        (channel, row): (usize, &ArrayView1<f64>)|
     -> Result<Vec<f64>> {
        let samples = row.to_vec();
        validate_samples(&samples).map_err(|e| match e {
            PsdError::InvalidParameter { name, reason } => PsdError::InvalidParameter {
                name,
                reason: format!("channel {}: {}", channel, reason),
            },
            other => other,
        })?;
        est.estimate_values_unchecked(&samples)
    };

    #[cfg(feature = "parallel")]
    let psds: Vec<Vec<f64>> = rows
        .par_iter()
        .enumerate()
        .map_init(|| estimator.clone(), estimate_row)
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let psds: Vec<Vec<f64>> = {
        let mut est = estimator.clone();
        rows.iter()
            .enumerate()
            .map(|item| estimate_row(&mut est, item))
            .collect::<Result<_>>()?
    };

    let mut matrix = Array2::zeros((psds.len(), estimator.num_bins()));
    for (mut out, psd) in matrix.rows_mut().into_iter().zip(psds.iter()) {
        out.assign(&ArrayView1::from(psd.as_slice()));
    }

    Ok((estimator.frequencies(), matrix))
}
