//! End-to-end properties of the public estimators

use std::f64::consts::PI;

use vibration_psd::spectrum::maximax::{maximax, MaximaxParams};
use vibration_psd::spectrum::rms::{integrate_psd, parseval_check, PARSEVAL_TOLERANCE};
use vibration_psd::spectrum::windows::WindowType;
use vibration_psd::{
    maximax_psd, rms_from_psd, to_db, to_octave_bands, welch_psd, OctaveFraction, PsdConfig,
    Resolution, Signal, SpectralAnalyzer,
};

const FS: f64 = 1000.0;

fn sine(freq: f64, amplitude: f64, fs: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| amplitude * (2.0 * PI * freq * i as f64 / fs).sin())
        .collect()
}

/// Deterministic uniform noise in [-1, 1) from a 64-bit LCG
fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        })
        .collect()
}

fn mixed(n: usize) -> Vec<f64> {
    let a = sine(50.0, 1.0, FS, n);
    let b = sine(123.4, 0.5, FS, n);
    let w = noise(n, 7);
    (0..n).map(|i| a[i] + b[i] + 0.2 * w[i]).collect()
}

#[test]
fn welch_satisfies_parseval_for_every_window() {
    let samples = mixed(10_000);
    for window in WindowType::ALL {
        let psd = welch_psd(&samples, FS, 1000, 500, window).unwrap();
        let check = parseval_check(&samples, &psd).unwrap();
        assert!(
            check.is_within(PARSEVAL_TOLERANCE),
            "{}: time {} vs psd {}",
            window,
            check.time_rms,
            check.psd_rms
        );
    }
}

#[test]
fn sine_peak_and_rms() {
    let samples = sine(50.0, 1.0, FS, 10_000);
    let psd = welch_psd(&samples, FS, 1000, 500, WindowType::Hann).unwrap();

    assert_eq!(psd.len(), 501);
    assert!((psd.frequencies()[1] - 1.0).abs() < 1e-12);

    let (peak_freq, _) = psd.peak().unwrap();
    assert!((peak_freq - 50.0).abs() <= psd.df());

    let rms = rms_from_psd(psd.frequencies(), psd.values(), None, None).unwrap();
    let expected = 1.0 / 2f64.sqrt();
    assert!((rms - expected).abs() / expected < 0.10, "rms = {}", rms);
}

#[test]
fn two_tones_give_two_local_maxima() {
    let n = 10_000;
    let a = sine(10.0, 1.0, FS, n);
    let b = sine(50.0, 1.0, FS, n);
    let samples: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x + y).collect();

    let psd = welch_psd(&samples, FS, 1000, 500, WindowType::Hann).unwrap();
    let values = psd.values();
    for freq in [10.0, 50.0] {
        let k = psd.nearest_bin(freq).unwrap();
        assert!(values[k] > values[k - 1] && values[k] > values[k + 1]);
        // Well above the floor between the tones
        assert!(values[k] > 1e3 * values[psd.nearest_bin(30.0).unwrap()]);
    }
}

#[test]
fn maximax_layout_and_envelope() {
    let samples = sine(50.0, 1.0, FS, 10_000);
    let result = maximax(&samples, FS, &MaximaxParams::default()).unwrap();

    assert_eq!(result.window_len, 1000);
    assert_eq!(result.window_count, 19);

    let welch = welch_psd(&samples, FS, 1000, 500, WindowType::Hann).unwrap();
    assert_eq!(result.spectrum.frequencies(), welch.frequencies());

    for (m, w) in result.spectrum.values().iter().zip(welch.values()) {
        assert!(m >= w, "{} < {}", m, w);
    }
    let k = welch.nearest_bin(50.0).unwrap();
    assert!(result.spectrum.values()[k] >= welch.values()[k]);
}

#[test]
fn maximax_catches_a_burst_welch_dilutes() {
    let n = 20_000;
    let mut samples = noise(n, 3).into_iter().map(|v| 0.01 * v).collect::<Vec<_>>();
    let burst = sine(200.0, 2.0, FS, 1000);
    for (i, v) in burst.iter().enumerate() {
        samples[12_000 + i] += v;
    }

    let welch = welch_psd(&samples, FS, 1000, 500, WindowType::Hann).unwrap();
    let envelope = maximax_psd(&samples, FS, 1.0, 50.0, 1.0, WindowType::Hann).unwrap();

    let k = welch.nearest_bin(200.0).unwrap();
    // A 1 s burst in a 20 s record is diluted by roughly the record length
    assert!(envelope.values()[k] > 5.0 * welch.values()[k]);
}

#[test]
fn octave_reduction_conserves_energy() {
    let samples = mixed(20_000);
    let psd = welch_psd(&samples, FS, 2000, 1000, WindowType::Hann).unwrap();

    for fraction in OctaveFraction::ALL {
        let bands = to_octave_bands(psd.frequencies(), psd.values(), fraction, 5.0, 400.0).unwrap();
        let first = bands.bands()[0];
        let last = bands.bands()[bands.len() - 1];

        let direct = integrate_psd(psd.frequencies(), psd.values(), first.lower, last.upper);
        let banded: f64 = bands
            .values()
            .iter()
            .zip(bands.bandwidths())
            .map(|(v, bw)| v * bw)
            .sum();
        assert!(
            (banded - direct).abs() <= 1e-9 * direct,
            "{}: {} vs {}",
            fraction,
            banded,
            direct
        );
    }
}

#[test]
fn db_scale_is_finite_and_monotonic() {
    let samples = sine(50.0, 1.0, FS, 4000);
    let psd = welch_psd(&samples, FS, 1000, 500, WindowType::Hann).unwrap();

    let db = to_db(psd.values(), 1.0).unwrap();
    assert!(db.iter().all(|v| v.is_finite()));

    let mut pairs: Vec<(f64, f64)> = psd.values().iter().copied().zip(db).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    for w in pairs.windows(2) {
        assert!(w[1].1 >= w[0].1);
    }
}

#[test]
fn analyzer_runs_the_full_chain() {
    let signal = Signal::new(mixed(10_000), FS).unwrap();
    let analyzer = SpectralAnalyzer::new(PsdConfig {
        resolution: Resolution::Df(2.0),
        compute_maximax: true,
        octave_fraction: Some(OctaveFraction::Third),
        ..PsdConfig::default()
    })
    .unwrap();

    let report = analyzer.analyze(&signal).unwrap();
    assert_eq!(report.plan.segment_len, 500);
    assert!((report.welch.df() - 2.0).abs() < 1e-12);
    assert!(report.parseval.is_within(PARSEVAL_TOLERANCE));

    let maximax = report.maximax.as_ref().unwrap();
    assert_eq!(maximax.spectrum.frequencies(), report.welch.frequencies());
    assert!(report.maximax_rms.unwrap() >= report.rms * 0.99);

    assert!(report.welch_octave.is_some());
    assert!(report.maximax_octave.is_some());
}

#[test]
fn invalid_inputs_are_rejected() {
    let samples = sine(50.0, 1.0, FS, 500);

    let err = welch_psd(&samples, FS, 1000, 500, WindowType::Hann).unwrap_err();
    assert_eq!(err.parameter(), Some("segment_len"));

    let err = welch_psd(&[], FS, 1000, 500, WindowType::Hann).unwrap_err();
    assert_eq!(err.parameter(), Some("signal"));

    let err = welch_psd(&samples, 0.0, 100, 50, WindowType::Hann).unwrap_err();
    assert_eq!(err.parameter(), Some("sample_rate"));

    let err = maximax_psd(&samples, FS, 1.0, 50.0, 1.0, WindowType::Hann).unwrap_err();
    assert!(err.parameter().is_some());

    assert!(to_db(&[1.0], 0.0).is_err());
}
