//! Totals compilation tests.

use insta::assert_snapshot;
use metrics_runtime::query::{
    compile_totals, Arg, CompileError, CompileOptions, Condition, FilterValue, MetricsViewFilter,
    TotalsRequest,
};

fn request(measures: &[&str]) -> TotalsRequest {
    TotalsRequest {
        metrics_view_name: "sales".to_string(),
        measure_names: measures.iter().map(|m| m.to_string()).collect(),
        time_start: 1_000,
        time_end: 2_000,
        filter: None,
    }
}

#[test]
fn test_totals_with_filter() {
    let req = TotalsRequest {
        filter: Some(MetricsViewFilter::default().include(
            Condition::new("region").with_in(vec![FilterValue::from("us"), FilterValue::from("eu")]),
        )),
        ..request(&["revenue"])
    };
    let compiled = compile_totals(&req, &CompileOptions::default()).unwrap();

    assert_snapshot!(
        compiled.sql,
        @"SELECT revenue FROM sales WHERE timestamp >= epoch(?) AND timestamp < epoch(?)  AND (region  IN (?,?))"
    );
    assert_eq!(
        compiled.args,
        vec![
            Arg::Int(1_000),
            Arg::Int(2_000),
            Arg::from("us"),
            Arg::from("eu")
        ]
    );
}

#[test]
fn test_totals_without_filter() {
    let compiled =
        compile_totals(&request(&["revenue", "orders"]), &CompileOptions::default()).unwrap();

    assert_eq!(
        compiled.sql,
        "SELECT revenue, orders FROM sales WHERE timestamp >= epoch(?) AND timestamp < epoch(?) "
    );
    assert!(!compiled.sql.contains("GROUP BY"));
    assert!(!compiled.sql.contains("LIMIT"));
    assert_eq!(compiled.args, vec![Arg::Int(1_000), Arg::Int(2_000)]);
}

#[test]
fn test_totals_exclude_null() {
    let req = TotalsRequest {
        filter: Some(
            MetricsViewFilter::default()
                .exclude(Condition::new("region").with_in(vec![FilterValue::Null])),
        ),
        ..request(&["revenue"])
    };
    let compiled = compile_totals(&req, &CompileOptions::default()).unwrap();

    assert!(compiled.sql.ends_with(" AND (region IS NOT NULL)"));
    assert_eq!(compiled.args.len(), 2);
}

#[test]
fn test_empty_measures_rejected() {
    let err = compile_totals(&request(&[]), &CompileOptions::default()).unwrap_err();
    assert_eq!(err, CompileError::EmptyMeasures);
}
