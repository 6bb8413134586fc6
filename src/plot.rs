//! Vega-Lite charts of a series with its anomalies.
//!
//! The chart is a line of the series with the anomalies drawn as points on
//! top. The result is a plain JSON specification that any Vega-Lite renderer
//! accepts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::{json, Value};

use crate::detection::Anomalies;

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
const LINE_COLOR: &str = "#fa9088";
const POINT_COLOR: &str = "#19c7ca";

/// Time-like keys that can be placed on a temporal axis.
pub trait TemporalKey {
    /// ISO 8601 representation used as the x value.
    fn iso8601(&self) -> String;

    /// Calendar dates carry no time zone and are placed on a UTC scale.
    fn utc_scale() -> bool {
        false
    }
}

impl TemporalKey for NaiveDate {
    fn iso8601(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }

    fn utc_scale() -> bool {
        true
    }
}

impl TemporalKey for NaiveDateTime {
    fn iso8601(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

impl<Tz: TimeZone> TemporalKey for DateTime<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    fn iso8601(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string()
    }
}

/// Chart of a plain series, x is the sample index.
///
/// # Example
/// ```
/// use anofox_anomaly::prelude::*;
/// use anofox_anomaly::plot::vega_lite;
///
/// let mut series: Vec<f64> = (0..60).map(|i| (i % 7) as f64 + 0.1 * (i % 3) as f64).collect();
/// series[20] = 40.0;
/// let anomalies = AnomalyDetector::new(7).detect(&series).unwrap();
///
/// let chart = vega_lite(&series, &anomalies);
/// assert_eq!(chart["data"]["values"][20]["anomaly"], true);
/// ```
pub fn vega_lite(series: &[f64], anomalies: &Anomalies) -> Value {
    let values: Vec<Value> = series
        .iter()
        .enumerate()
        .map(|(i, &y)| json!({ "x": i, "y": y, "anomaly": anomalies.is_anomaly(i) }))
        .collect();

    chart(values, json!({ "field": "x", "type": "quantitative" }))
}

/// Chart of a time-keyed series, as returned by
/// [`AnomalyDetector::detect_keyed`](crate::detection::AnomalyDetector::detect_keyed).
pub fn vega_lite_keyed<K: Ord + TemporalKey>(series: &BTreeMap<K, f64>, anomalies: &[K]) -> Value {
    let flagged: BTreeSet<&K> = anomalies.iter().collect();
    let values: Vec<Value> = series
        .iter()
        .map(|(k, &y)| json!({ "x": k.iso8601(), "y": y, "anomaly": flagged.contains(k) }))
        .collect();

    let mut x = json!({ "field": "x", "type": "temporal" });
    if K::utc_scale() {
        x["scale"] = json!({ "type": "utc" });
    }
    chart(values, x)
}

fn chart(values: Vec<Value>, x: Value) -> Value {
    json!({
        "$schema": SCHEMA,
        "data": { "values": values },
        "layer": [
            {
                "mark": { "type": "line" },
                "encoding": {
                    "x": x.clone(),
                    "y": { "field": "y", "type": "quantitative", "scale": { "zero": false } },
                    "color": { "value": LINE_COLOR }
                }
            },
            {
                "transform": [{ "filter": "datum.anomaly == true" }],
                "mark": { "type": "point", "size": 200 },
                "encoding": {
                    "x": x,
                    "y": { "field": "y", "type": "quantitative" },
                    "color": { "value": POINT_COLOR }
                }
            }
        ],
        "config": { "axis": { "title": null, "labelFontSize": 12 } }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::AnomalyDetector;
    use chrono::Utc;

    fn flagged_count(chart: &Value) -> usize {
        chart["data"]["values"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|v| v["anomaly"] == true)
            .count()
    }

    #[test]
    fn plain_series_uses_index_axis() {
        let series = [1.0, 2.0, 9.0, 2.0];
        let anomalies = Anomalies::new(vec![2], 4);

        let chart = vega_lite(&series, &anomalies);

        assert_eq!(chart["$schema"], SCHEMA);
        let values = chart["data"]["values"].as_array().unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[2], json!({ "x": 2, "y": 9.0, "anomaly": true }));
        assert_eq!(values[0]["anomaly"], false);
        assert_eq!(chart["layer"][0]["encoding"]["x"]["type"], "quantitative");
        assert_eq!(chart["layer"][1]["encoding"]["x"]["type"], "quantitative");
        assert_eq!(flagged_count(&chart), 1);
    }

    #[test]
    fn layers_draw_line_and_points() {
        let chart = vega_lite(&[1.0, 2.0], &Anomalies::new(Vec::new(), 2));

        assert_eq!(chart["layer"][0]["mark"]["type"], "line");
        assert_eq!(chart["layer"][0]["encoding"]["y"]["scale"]["zero"], false);
        assert_eq!(chart["layer"][0]["encoding"]["color"]["value"], LINE_COLOR);
        assert_eq!(chart["layer"][1]["mark"], json!({ "type": "point", "size": 200 }));
        assert_eq!(chart["layer"][1]["transform"][0]["filter"], "datum.anomaly == true");
        assert_eq!(chart["layer"][1]["encoding"]["color"]["value"], POINT_COLOR);
        assert!(chart["config"]["axis"]["title"].is_null());
        assert_eq!(flagged_count(&chart), 0);
    }

    #[test]
    fn dates_use_utc_temporal_axis() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series: BTreeMap<NaiveDate, f64> = (0..5)
            .map(|i| (start + chrono::Duration::days(i), i as f64))
            .collect();
        let anomalies = vec![start + chrono::Duration::days(3)];

        let chart = vega_lite_keyed(&series, &anomalies);

        let x = &chart["layer"][0]["encoding"]["x"];
        assert_eq!(x["type"], "temporal");
        assert_eq!(x["scale"]["type"], "utc");
        assert_eq!(chart["data"]["values"][0]["x"], "2024-01-01");
        assert_eq!(chart["data"]["values"][3]["anomaly"], true);
        assert_eq!(flagged_count(&chart), 1);
    }

    #[test]
    fn timestamps_keep_offset() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        let series = BTreeMap::from([(t, 1.5)]);

        let chart = vega_lite_keyed(&series, &[]);

        assert_eq!(chart["data"]["values"][0]["x"], "2024-03-05T07:08:09.000+0000");
        assert!(chart["layer"][0]["encoding"]["x"].get("scale").is_none());
    }

    #[test]
    fn naive_timestamps_have_no_offset() {
        let t = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(t.iso8601(), "2024-03-05T07:08:09.000");
    }

    #[test]
    fn detected_series_round_trip_into_chart() {
        let mut series: Vec<f64> = (0..60)
            .map(|i| (i % 7) as f64 + 0.1 * (i % 3) as f64)
            .collect();
        series[20] = 40.0;
        let anomalies = AnomalyDetector::new(7).detect(&series).unwrap();

        let chart = vega_lite(&series, &anomalies);

        assert_eq!(flagged_count(&chart), anomalies.count());
        assert_eq!(chart["data"]["values"][20]["anomaly"], true);
    }
}
