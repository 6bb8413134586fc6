//! End-to-end detection scenarios on small, hand-built series.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use anofox_anomaly::detection::{detect, Detection, NeverCancel};
use anofox_anomaly::prelude::*;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

const WEEKLY: [f64; 7] = [2.0, 4.0, 6.0, 8.0, 6.0, 4.0, 2.0];

/// Weekly pattern with a little deterministic wobble.
fn weekly(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            10.0 + WEEKLY[i % 7] + 0.3 * (1.7 * i as f64).sin() + 0.2 * ((i * 13) % 5) as f64 / 5.0
        })
        .collect()
}

fn weekly_with_spikes() -> Vec<f64> {
    let mut series = weekly(100);
    for (i, delta) in [(10, 25.0), (25, -20.0), (47, 30.0), (63, -25.0), (88, 20.0)] {
        series[i] += delta;
    }
    series
}

fn ruby_series() -> Vec<f64> {
    vec![
        5.0, 9.0, 2.0, 9.0, 0.0, 6.0, 3.0, 8.0, 5.0, 18.0, 7.0, 8.0, 8.0, 0.0, 2.0, -5.0, 0.0, 5.0,
        6.0, 7.0, 3.0, 6.0, 1.0, 4.0, 4.0, 4.0, 30.0, 7.0, 5.0, 8.0,
    ]
}

#[test]
fn finds_exactly_the_injected_spikes() {
    let anomalies = AnomalyDetector::new(7)
        .max_anoms(0.1)
        .alpha(0.05)
        .direction(Direction::Both)
        .detect(&weekly_with_spikes())
        .unwrap();

    assert_eq!(anomalies.indices(), &[10, 25, 47, 63, 88]);
    assert_eq!(anomalies.count(), 5);
    assert!((anomalies.anomaly_percentage() - 5.0).abs() < 1e-12);
}

#[test]
fn direction_selects_spike_sign() {
    let series = weekly_with_spikes();

    let positive = AnomalyDetector::new(7)
        .direction(Direction::Positive)
        .detect(&series)
        .unwrap();
    assert_eq!(positive.indices(), &[10, 47, 88]);

    let negative = AnomalyDetector::new(7)
        .direction(Direction::Negative)
        .detect(&series)
        .unwrap();
    assert_eq!(negative.indices(), &[25, 63]);
}

#[test]
fn max_anoms_caps_the_search() {
    // floor(100 * 0.02) = 2 rounds, the two largest deviations win
    let anomalies = AnomalyDetector::new(7)
        .max_anoms(0.02)
        .detect(&weekly_with_spikes())
        .unwrap();
    assert_eq!(anomalies.indices(), &[47, 63]);
}

#[test]
fn short_weekly_series() {
    let series = ruby_series();

    let both = AnomalyDetector::new(7).max_anoms(0.2).detect(&series).unwrap();
    assert_eq!(both.indices(), &[9, 15, 26]);

    let positive = AnomalyDetector::new(7)
        .max_anoms(0.2)
        .direction(Direction::Positive)
        .detect(&series)
        .unwrap();
    assert_eq!(positive.indices(), &[9, 26]);

    let negative = AnomalyDetector::new(7)
        .max_anoms(0.2)
        .direction(Direction::Negative)
        .detect(&series)
        .unwrap();
    assert_eq!(negative.indices(), &[15]);

    let strict = AnomalyDetector::new(7)
        .max_anoms(0.2)
        .alpha(0.001)
        .detect(&series)
        .unwrap();
    assert_eq!(strict.indices(), &[9, 15, 26]);
}

#[test]
fn dated_series_charts_its_anomalies() {
    let start = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
    let series: BTreeMap<NaiveDate, f64> = ruby_series()
        .into_iter()
        .enumerate()
        .map(|(i, v)| (start + Duration::days(i as i64), v))
        .collect();

    let anomalies = AnomalyDetector::new(7).max_anoms(0.2).detect_keyed(&series).unwrap();
    let chart = vega_lite_keyed(&series, &anomalies);

    let values = chart["data"]["values"].as_array().unwrap();
    assert_eq!(values.len(), 30);
    let flagged: Vec<&str> = values
        .iter()
        .filter(|v| v["anomaly"] == true)
        .map(|v| v["x"].as_str().unwrap())
        .collect();
    assert_eq!(flagged, ["2014-01-10", "2014-01-16", "2014-01-27"]);
    assert_eq!(chart["layer"][1]["encoding"]["x"]["type"], "temporal");
}

#[test]
fn period_one_runs_without_decomposition() {
    let anomalies = AnomalyDetector::new(1)
        .max_anoms(0.2)
        .detect(&ruby_series())
        .unwrap();
    assert_eq!(anomalies.indices(), &[9, 15, 26]);

    let mut wave: Vec<f64> = (0..50).map(|i| (0.9 * i as f64).sin()).collect();
    wave[33] = 9.0;
    wave[7] = -8.0;
    let anomalies = AnomalyDetector::new(1).detect(&wave).unwrap();
    assert_eq!(anomalies.indices(), &[7, 33]);
}

#[test]
fn length_boundary_is_two_periods() {
    let ok = AnomalyDetector::new(7).max_anoms(0.2).detect(&weekly(14));
    assert!(ok.is_ok());

    let err = AnomalyDetector::new(7)
        .max_anoms(0.2)
        .detect(&weekly(13))
        .unwrap_err();
    assert_eq!(err, AnomalyError::InsufficientData { needed: 14, got: 13 });
    assert_eq!(err.to_string(), "insufficient data: need at least 14, got 13");
}

#[test]
fn nan_is_rejected_at_any_position() {
    for pos in [0, 1, 50, 98, 99] {
        let mut series = weekly(100);
        series[pos] = f64::NAN;
        let err = AnomalyDetector::new(7).detect(&series).unwrap_err();
        match err {
            AnomalyError::InvalidInput(msg) => assert!(msg.contains("NANs"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let series = weekly(100);
    for alpha in [0.0, -0.5, 1.5, f64::NAN] {
        let err = AnomalyDetector::new(7).alpha(alpha).detect(&series).unwrap_err();
        assert!(matches!(err, AnomalyError::InvalidConfiguration(_)));
    }
    for max_anoms in [0.0, 1.01] {
        let err = AnomalyDetector::new(7)
            .max_anoms(max_anoms)
            .detect(&series)
            .unwrap_err();
        assert!(matches!(err, AnomalyError::InvalidConfiguration(_)));
    }
}

#[test]
fn constant_series_yields_nothing() {
    let anomalies = AnomalyDetector::new(7).detect(&vec![42.0; 70]).unwrap();
    assert!(anomalies.is_empty());
}

#[test]
fn long_series() {
    let mut series = weekly(2000);
    let spikes: Vec<usize> = (50..2000).step_by(200).collect();
    for &i in &spikes {
        series[i] += 15.0;
    }

    let anomalies = AnomalyDetector::new(7).max_anoms(0.05).detect(&series).unwrap();
    assert_eq!(anomalies.indices(), spikes.as_slice());
}

#[test]
fn random_noise_with_spikes() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut series: Vec<f64> = (0..300)
        .map(|i| 50.0 + 5.0 * WEEKLY[i % 7] + rng.gen_range(-1.0..1.0))
        .collect();
    let spikes = [17, 120, 121, 250];
    for (k, &i) in spikes.iter().enumerate() {
        series[i] += if k % 2 == 0 { 50.0 } else { -50.0 };
    }

    let anomalies = AnomalyDetector::new(7).max_anoms(0.05).detect(&series).unwrap();
    assert_eq!(anomalies.indices(), &spikes);
}

#[test]
fn timestamped_series() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let series: BTreeMap<_, _> = weekly_with_spikes()
        .into_iter()
        .enumerate()
        .map(|(i, v)| (start + Duration::days(i as i64), v))
        .collect();

    let keys = AnomalyDetector::new(7).detect_keyed(&series).unwrap();

    let expected: Vec<_> = [10, 25, 47, 63, 88]
        .iter()
        .map(|&i| start + Duration::days(i))
        .collect();
    assert_eq!(keys, expected);
}

#[test]
fn cancel_token_stops_detection() {
    let token = CancelToken::new();
    let handle = token.clone();
    handle.cancel();

    let detection = AnomalyDetector::new(7)
        .detect_with_cancel(&weekly_with_spikes(), &token)
        .unwrap();
    assert!(detection.is_canceled());
    assert!(detection.anomalies().is_empty());
    assert!(detection.complete().is_none());
}

#[test]
fn cancellation_keeps_rounds_already_confirmed() {
    let polls = std::cell::Cell::new(0);
    let cancel = || {
        polls.set(polls.get() + 1);
        polls.get() > 2
    };

    let detection = detect(
        &weekly_with_spikes(),
        7,
        &DetectionConfig::default(),
        &cancel,
    )
    .unwrap();

    match detection {
        Detection::Canceled(anomalies) => assert_eq!(anomalies.indices(), &[47, 63]),
        other => panic!("expected cancel, got {:?}", other),
    }
    assert_eq!(polls.get(), 3);
}

#[test]
fn function_and_builder_agree() {
    let series = weekly_with_spikes();
    let config = DetectionConfig::default()
        .with_max_anoms(0.1)
        .with_direction(Direction::Positive);

    let detection = detect(&series, 7, &config, &NeverCancel).unwrap();
    let anomalies = AnomalyDetector::new(7)
        .with_config(config)
        .detect(&series)
        .unwrap();

    assert_eq!(detection.complete(), Some(anomalies));
}

/// In-memory sink for captured log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture<T>(filter: &str, f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buffer.contents())
}

#[test]
fn verbose_logging_reports_each_round() {
    let series = weekly_with_spikes();

    let (verbose, logs) = capture("info", || {
        AnomalyDetector::new(7).verbose(true).detect(&series)
    });
    let quiet = AnomalyDetector::new(7).detect(&series).unwrap();

    assert_eq!(verbose.unwrap(), quiet);
    for i in 1..=10 {
        assert!(logs.contains(&format!("{} / 10", i)), "missing round {}: {}", i, logs);
    }
    assert!(!logs.contains("11 / 10"));
}

#[test]
fn quiet_detection_logs_nothing_at_info() {
    let series = weekly_with_spikes();

    let (result, logs) = capture("info", || AnomalyDetector::new(7).detect(&series));

    assert!(result.is_ok());
    assert!(!logs.contains("1 / 10"), "unexpected output: {}", logs);
}
