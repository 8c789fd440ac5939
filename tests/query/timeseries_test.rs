//! Time series compilation tests.

use insta::assert_snapshot;
use metrics_runtime::query::{
    compile_timeseries, Arg, CompileError, CompileOptions, Condition, FilterValue,
    MetricsViewFilter, TimeGrain, TimeSeriesRequest,
};

fn request(measures: &[&str], grain: TimeGrain) -> TimeSeriesRequest {
    TimeSeriesRequest {
        metrics_view_name: "ad_bids".to_string(),
        measure_names: measures.iter().map(|m| m.to_string()).collect(),
        time_start: 1_000,
        time_end: 2_000,
        time_granularity: grain,
        filter: None,
    }
}

#[test]
fn test_hourly_series() {
    let req = request(&["bid_price", "impressions"], TimeGrain::Hour);
    let compiled = compile_timeseries(&req, &CompileOptions::default()).unwrap();

    assert_snapshot!(
        compiled.sql,
        @"SELECT DATE_TRUNC('hour', timestamp) AS timestamp, bid_price, impressions FROM ad_bids WHERE timestamp >= epoch(?) AND timestamp < epoch(?)  GROUP BY timestamp LIMIT 1000"
    );
    assert_eq!(compiled.args, vec![Arg::Int(1_000), Arg::Int(2_000)]);
}

#[test]
fn test_custom_time_column() {
    let req = request(&["bid_price"], TimeGrain::Day);
    let options = CompileOptions::default().with_time_column("event_time");
    let compiled = compile_timeseries(&req, &options).unwrap();

    assert!(compiled
        .sql
        .starts_with("SELECT DATE_TRUNC('day', event_time) AS event_time, bid_price"));
    assert!(compiled.sql.ends_with("GROUP BY event_time LIMIT 1000"));
}

#[test]
fn test_filter_args_follow_time_range() {
    let req = TimeSeriesRequest {
        filter: Some(
            MetricsViewFilter::default()
                .include(Condition::new("publisher").with_in(vec![FilterValue::from("Google")])),
        ),
        ..request(&["bid_price"], TimeGrain::Minute)
    };
    let compiled = compile_timeseries(&req, &CompileOptions::default()).unwrap();

    assert!(compiled
        .sql
        .contains("epoch(?)  AND (publisher  IN (?)) GROUP BY timestamp"));
    assert_eq!(
        compiled.args,
        vec![Arg::Int(1_000), Arg::Int(2_000), Arg::from("Google")]
    );
}

#[test]
fn test_zero_bounds_are_still_bound() {
    let req = TimeSeriesRequest {
        time_start: 0,
        time_end: 0,
        ..request(&["bid_price"], TimeGrain::Day)
    };
    let compiled = compile_timeseries(&req, &CompileOptions::default()).unwrap();
    assert_eq!(compiled.args, vec![Arg::Int(0), Arg::Int(0)]);
}

#[test]
fn test_limit_comes_from_options() {
    let req = request(&["bid_price"], TimeGrain::Week);
    let options = CompileOptions {
        timeseries_limit: 50,
        ..CompileOptions::default()
    };
    let compiled = compile_timeseries(&req, &options).unwrap();
    assert!(compiled.sql.ends_with("LIMIT 50"));
}

#[test]
fn test_empty_measures_rejected() {
    let req = request(&[], TimeGrain::Day);
    let err = compile_timeseries(&req, &CompileOptions::default()).unwrap_err();
    assert_eq!(err, CompileError::EmptyMeasures);
}
