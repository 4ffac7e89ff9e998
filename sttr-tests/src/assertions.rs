//! Assertions over aggregated report tables

use sttr_runtime::WindowReport;

/// Assert that `counts` never increases
pub fn assert_sorted_desc(what: &str, counts: &[u64]) {
    for pair in counts.windows(2) {
        assert!(
            pair[0] >= pair[1],
            "{} not sorted descending by count: {:?}",
            what,
            counts
        );
    }
}

/// Assert every table of a window is non-zero and sorted descending
pub fn assert_report_ordered(report: &WindowReport) {
    let failures: Vec<u64> = report.pareto.failures.iter().map(|r| r.count).collect();
    let totals: Vec<u64> = report.pareto.totals.iter().map(|t| t.count).collect();
    let origins: Vec<u64> = report.lineage.iter().map(|l| l.count).collect();

    for (what, counts) in [
        ("failures", &failures),
        ("station totals", &totals),
        ("hairpin origins", &origins),
    ] {
        assert!(
            counts.iter().all(|&c| c > 0),
            "{} of the {} window contain a zero count: {:?}",
            what,
            report.window.kind,
            counts
        );
        assert_sorted_desc(what, counts);
    }
}

/// Assert the station total for `station` is `expected`
pub fn assert_station_total(report: &WindowReport, station: &str, expected: u64) {
    let total = report
        .pareto
        .totals
        .iter()
        .find(|t| t.station_id == station)
        .unwrap_or_else(|| panic!("no total for station {}: {:?}", station, report.pareto.totals));
    assert_eq!(total.count, expected, "total for station {}", station);
}
