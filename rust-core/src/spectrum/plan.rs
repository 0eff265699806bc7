//! Segmentation planner
//!
//! Turns a requested frequency resolution (or an explicit segment length)
//! into the segment and overlap lengths a Welch estimate runs with. The
//! achieved resolution is reported back because power-of-two rounding moves
//! it away from the request.

use crate::error::{validate_sample_rate, PsdError, Result};
use log::debug;

/// How the segment length is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Target bin spacing in Hz; segment length = round(fs / df)
    Df(f64),
    /// Explicit segment length in samples
    SegmentLength(usize),
}

/// Overlap used when none is requested
pub const DEFAULT_OVERLAP_PERCENT: f64 = 50.0;

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Df(1.0)
    }
}

/// Segment sizing derived for one estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlan {
    /// Samples per segment (also the FFT length)
    pub segment_len: usize,

    /// Samples shared by consecutive segments
    pub overlap_len: usize,

    /// Achieved bin spacing fs / segment_len, in Hz
    pub actual_df: f64,
}

impl SegmentPlan {
    /// Hop between consecutive segment starts
    pub fn stride(&self) -> usize {
        self.segment_len - self.overlap_len
    }

    /// Number of whole segments that fit in `available` samples
    ///
    /// A trailing partial segment is dropped.
    pub fn segment_count(&self, available: usize) -> usize {
        if available < self.segment_len {
            return 0;
        }
        (available - self.segment_len) / self.stride() + 1
    }

}

/// Derive a segmentation plan
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz
/// * `resolution` - Requested df or explicit segment length
/// * `overlap_percent` - Segment overlap in percent; `None` means 50%
/// * `round_to_power_of_two` - Round the segment length up to the next power of two
/// * `available_samples` - Samples the plan must fit into
pub fn plan(
    sample_rate: f64,
    resolution: Resolution,
    overlap_percent: Option<f64>,
    round_to_power_of_two: bool,
    available_samples: usize,
) -> Result<SegmentPlan> {
    validate_sample_rate(sample_rate)?;

    let mut segment_len = match resolution {
        Resolution::Df(df) => {
            if !df.is_finite() || df <= 0.0 {
                return Err(PsdError::invalid(
                    "desired_df",
                    format!("must be a finite value > 0 Hz (got {})", df),
                ));
            }
            let len = (sample_rate / df).round();
            if len < 1.0 {
                return Err(PsdError::invalid(
                    "desired_df",
                    format!(
                        "{} Hz is coarser than the sample rate {} Hz allows (segment length < 1)",
                        df, sample_rate
                    ),
                ));
            }
            if len > usize::MAX as f64 {
                return Err(PsdError::invalid(
                    "desired_df",
                    format!("{} Hz yields an unrepresentable segment length", df),
                ));
            }
            len as usize
        }
        Resolution::SegmentLength(len) => len,
    };

    if segment_len < 1 {
        return Err(PsdError::invalid("segment_len", "must be at least 1 sample"));
    }

    if round_to_power_of_two {
        segment_len = segment_len.checked_next_power_of_two().ok_or_else(|| {
            PsdError::invalid("segment_len", "cannot be rounded to a power of two")
        })?;
    }

    let overlap_len =
        overlap_from_percent(segment_len, overlap_percent.unwrap_or(DEFAULT_OVERLAP_PERCENT))?;

    validate_segmentation(segment_len, overlap_len, available_samples)?;

    let plan = SegmentPlan {
        segment_len,
        overlap_len,
        actual_df: sample_rate / segment_len as f64,
    };

    debug!(
        "Segmentation plan: segment_len={}, overlap_len={}, actual_df={:.6} Hz ({} segments over {} samples)",
        plan.segment_len,
        plan.overlap_len,
        plan.actual_df,
        plan.segment_count(available_samples),
        available_samples
    );

    Ok(plan)
}

/// Overlap length for a percentage of `segment_len`, rounded down
///
/// Rounding down keeps the overlap below the segment length for any
/// percentage under 100, including one-sample segments.
pub fn overlap_from_percent(segment_len: usize, overlap_percent: f64) -> Result<usize> {
    if !overlap_percent.is_finite() || !(0.0..100.0).contains(&overlap_percent) {
        return Err(PsdError::invalid(
            "overlap_percent",
            format!("must be in [0, 100) (got {})", overlap_percent),
        ));
    }
    Ok((segment_len as f64 * overlap_percent / 100.0).floor() as usize)
}

/// Check explicit segment/overlap lengths against the available samples
pub fn validate_segmentation(segment_len: usize, overlap_len: usize, available: usize) -> Result<()> {
    if segment_len < 1 {
        return Err(PsdError::invalid("segment_len", "must be at least 1 sample"));
    }
    if overlap_len >= segment_len {
        return Err(PsdError::invalid(
            "overlap_len",
            format!(
                "must be smaller than segment_len ({} >= {})",
                overlap_len, segment_len
            ),
        ));
    }
    if segment_len > available {
        return Err(PsdError::invalid(
            "segment_len",
            format!(
                "{} samples exceeds the {} samples available",
                segment_len, available
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_from_df() {
        let plan = plan(1000.0, Resolution::Df(1.0), None, false, 10_000).unwrap();

        assert_eq!(plan.segment_len, 1000);
        assert_eq!(plan.overlap_len, 500);
        assert_eq!(plan.stride(), 500);
        assert!((plan.actual_df - 1.0).abs() < 1e-12);
        assert_eq!(plan.segment_count(10_000), 19);
    }

    #[test]
    fn test_plan_rounds_segment_length() {
        // 1000 / 3 = 333.33 -> 333 samples
        let plan = plan(1000.0, Resolution::Df(3.0), None, false, 10_000).unwrap();
        assert_eq!(plan.segment_len, 333);
        assert_eq!(plan.overlap_len, 166);
        assert!((plan.actual_df - 1000.0 / 333.0).abs() < 1e-12);

        // An explicit 50% gives the same overlap as the default
        let explicit = super::plan(1000.0, Resolution::Df(3.0), Some(50.0), false, 10_000).unwrap();
        assert_eq!(explicit, plan);
    }

    #[test]
    fn test_plan_power_of_two() {
        let plan = plan(1000.0, Resolution::Df(1.0), None, true, 10_000).unwrap();

        assert_eq!(plan.segment_len, 1024);
        assert_eq!(plan.overlap_len, 512);
        // Actual df differs from the requested 1 Hz
        assert!((plan.actual_df - 1000.0 / 1024.0).abs() < 1e-12);

        // Already a power of two stays put
        let plan = super::plan(1024.0, Resolution::Df(1.0), None, true, 4096).unwrap();
        assert_eq!(plan.segment_len, 1024);
    }

    #[test]
    fn test_plan_explicit_length_and_overlap() {
        let plan = plan(48000.0, Resolution::SegmentLength(256), Some(75.0), false, 1024).unwrap();

        assert_eq!(plan.segment_len, 256);
        assert_eq!(plan.overlap_len, 192);
        assert_eq!(plan.stride(), 64);
        assert_eq!(plan.segment_count(1024), 13);

        let no_overlap = super::plan(100.0, Resolution::SegmentLength(10), Some(0.0), false, 25).unwrap();
        assert_eq!(no_overlap.overlap_len, 0);
        assert_eq!(no_overlap.segment_count(25), 2);
    }

    #[test]
    fn test_plan_rejects_invalid_input() {
        let err = plan(0.0, Resolution::Df(1.0), None, false, 100).unwrap_err();
        assert_eq!(err.parameter(), Some("sample_rate"));

        let err = plan(1000.0, Resolution::Df(-1.0), None, false, 100).unwrap_err();
        assert_eq!(err.parameter(), Some("desired_df"));

        let err = plan(1000.0, Resolution::Df(5000.0), None, false, 100).unwrap_err();
        assert_eq!(err.parameter(), Some("desired_df"));

        let err = plan(1000.0, Resolution::SegmentLength(0), None, false, 100).unwrap_err();
        assert_eq!(err.parameter(), Some("segment_len"));

        // Segment longer than the record
        let err = plan(1000.0, Resolution::Df(1.0), None, false, 999).unwrap_err();
        assert_eq!(err.parameter(), Some("segment_len"));

        // Power-of-two rounding can push the segment past the record
        let err = plan(1000.0, Resolution::Df(1.0), None, true, 1000).unwrap_err();
        assert_eq!(err.parameter(), Some("segment_len"));

        let err = plan(1000.0, Resolution::Df(1.0), Some(100.0), false, 10_000).unwrap_err();
        assert_eq!(err.parameter(), Some("overlap_percent"));
    }

    #[test]
    fn test_validate_segmentation() {
        assert!(validate_segmentation(10, 5, 10).is_ok());
        assert_eq!(
            validate_segmentation(10, 10, 100).unwrap_err().parameter(),
            Some("overlap_len")
        );
        assert_eq!(
            validate_segmentation(0, 0, 100).unwrap_err().parameter(),
            Some("segment_len")
        );
        assert_eq!(
            validate_segmentation(101, 0, 100).unwrap_err().parameter(),
            Some("segment_len")
        );
    }

    #[test]
    fn test_overlap_from_percent_rounds_down() {
        assert_eq!(overlap_from_percent(333, 50.0).unwrap(), 166);
        assert_eq!(overlap_from_percent(256, 75.0).unwrap(), 192);
        assert_eq!(overlap_from_percent(1, 50.0).unwrap(), 0);
        assert_eq!(overlap_from_percent(10, 99.9).unwrap(), 9);
        assert!(overlap_from_percent(10, -1.0).is_err());
    }

    #[test]
    fn test_single_sample_segments() {
        // Length-1 segments are legal (overlap must then be 0)
        let plan = plan(10.0, Resolution::SegmentLength(1), None, false, 5).unwrap();
        assert_eq!(plan.overlap_len, 0);
        assert_eq!(plan.segment_count(5), 5);
    }
}
