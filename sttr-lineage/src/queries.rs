//! Trace queries
//!
//! Every trace follows the same join chain:
//!
//! - nest records at the hairpin-forming stations (`030*`, parameter `Nest`)
//! - genealogy history, from hairpin serial (`scanned_child_serial`) to the
//!   assembled stator
//! - failing records of the traced station for that stator
//! - the stack-serial genealogy record (inner join)
//! - the wire-spool batch record of the nest (left join)
//!
//! Results are grouped by failing station and origin station. Only the
//! counting rule and the failure filter differ between stations.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sttr_core::catalog::{CatalogConfig, QueryParam, QuerySpec, WINDOW_START};
use sttr_core::tolerance::{
    bands_predicate, sql_quote, ToleranceBand, ValueColumn, WorkLocationColumn, VISION_BANDS,
};
use sttr_core::ReportWindow;

/// How failing units are counted per origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingRule {
    /// Every joined record counts
    AllRows,
    /// Each assembled stator counts once
    DistinctProduct,
}

impl CountingRule {
    fn select_expr(&self) -> &'static str {
        match self {
            CountingRule::AllRows => "COUNT(*)",
            CountingRule::DistinctProduct => "COUNT(DISTINCT GH.product_serial)",
        }
    }
}

/// Which records of the traced station are failures
#[derive(Debug, Clone, PartialEq)]
pub enum FailureFilter {
    /// NOK process result for one parameter
    ProcessNok {
        parameter: &'static str,
        parameter_id: u32,
    },
    /// Step result status equals the given value
    ResultStatus(&'static str),
    /// Measured value outside any of the bands
    OutOfBand {
        bands: &'static [ToleranceBand],
        value: ValueColumn,
        location: WorkLocationColumn,
    },
}

impl FailureFilter {
    fn to_sql(&self) -> String {
        match self {
            FailureFilter::ProcessNok {
                parameter,
                parameter_id,
            } => format!(
                "overall_process_status = 'NOK'\n        AND parameter_name = {}\n        AND parameter_id = {}",
                sql_quote(parameter),
                parameter_id
            ),
            FailureFilter::ResultStatus(status) => {
                format!("result_status = {}", sql_quote(status))
            }
            FailureFilter::OutOfBand {
                bands,
                value,
                location,
            } => bands_predicate(bands, *value, *location),
        }
    }
}

/// Trace of one failing station back to its hairpin origin
#[derive(Debug, Clone, PartialEq)]
pub struct TraceQuery {
    pub failing_station: String,
    pub rule: CountingRule,
    pub failure_filter: FailureFilter,
    /// Carry the work-element naming table as a CTE
    pub with_lookup: bool,
}

impl TraceQuery {
    pub fn new(
        failing_station: impl Into<String>,
        rule: CountingRule,
        failure_filter: FailureFilter,
    ) -> Self {
        Self {
            failing_station: failing_station.into(),
            rule,
            failure_filter,
            with_lookup: false,
        }
    }

    pub fn with_lookup(mut self) -> Self {
        self.with_lookup = true;
        self
    }

    pub fn name(&self) -> String {
        format!("trace_{}_hairpin_origin", self.failing_station)
    }

    fn validate(&self) -> Result<()> {
        if self.failing_station.is_empty()
            || !self.failing_station.chars().all(|c| c.is_ascii_digit())
        {
            return Err(Error::InvalidTrace(format!(
                "failing station must be a numeric station id, got {:?}",
                self.failing_station
            )));
        }
        Ok(())
    }

    /// Render the trace as a catalog query bound to `window`
    pub fn to_query_spec(&self, window: &ReportWindow, config: &CatalogConfig) -> Result<QuerySpec> {
        self.validate()?;

        let lookup = if self.with_lookup {
            format!(
                ",\nwork_elements AS (\n    SELECT *\n    FROM {}\n)",
                config.lookup_table
            )
        } else {
            String::new()
        };

        let sql = format!(
            "WITH nest_parameter_records AS (
    SELECT product_serial, station_name
    FROM manufacturing.spinal.fct_spinal_parameter_records
    WHERE shop_name = :shop
    AND line_name = :line
    AND station_name LIKE '030%'
    AND parameter_name = 'Nest'
),
genealogy_hist AS (
    SELECT product_serial, scanned_child_serial
    FROM manufacturing.mes.fct_genealogy_hist
    WHERE shop_name = :shop
    AND line_name = :line
),
stack_serial AS (
    SELECT scanned_child_serial, product_serial
    FROM manufacturing.mes.fct_genealogy_hist
    WHERE line_name = :line
),
wire_spool AS (
    SELECT product_serial, parameter_value_raw
    FROM manufacturing.spinal.fct_spinal_parameter_records
    WHERE shop_name = :shop
    AND line_name = :line
    AND station_name LIKE '030%'
    AND parameter_name ILIKE '%batch%'
),
failing_station AS (
    SELECT product_serial, station_name
    FROM manufacturing.spinal.fct_spinal_parameter_records
    WHERE line_name = :line
    AND station_name ILIKE '%{station}%'
    AND recorded_at > :window_start
    AND {filter}
){lookup}
SELECT {count} AS COUNT,
    FS.station_name AS STATION_NAME,
    NPR.station_name AS STTR_030_HAIRPIN_ORIGIN
FROM nest_parameter_records AS NPR
JOIN genealogy_hist AS GH ON NPR.product_serial = GH.scanned_child_serial
JOIN failing_station AS FS ON GH.product_serial = FS.product_serial
JOIN stack_serial AS SS ON GH.product_serial = SS.product_serial
LEFT JOIN wire_spool AS WS ON NPR.product_serial = WS.product_serial
GROUP BY FS.station_name, NPR.station_name",
            station = self.failing_station,
            filter = self.failure_filter.to_sql(),
            lookup = lookup,
            count = self.rule.select_expr(),
        );

        Ok(
            QuerySpec::new(self.name(), self.failing_station.clone(), sql).with_params([
                QueryParam::string(WINDOW_START, window.start_param()),
                QueryParam::string("shop", &config.shop),
                QueryParam::string("line", &config.line),
            ]),
        )
    }
}

/// Traces run on every report: stations 040, 050 and 090
pub fn default_traces() -> Vec<TraceQuery> {
    vec![
        TraceQuery::new(
            "040",
            CountingRule::AllRows,
            FailureFilter::ProcessNok {
                parameter: "Force process value",
                parameter_id: 2,
            },
        ),
        TraceQuery::new(
            "050",
            CountingRule::DistinctProduct,
            FailureFilter::ResultStatus("FAIL"),
        ),
        TraceQuery::new(
            "090",
            CountingRule::DistinctProduct,
            FailureFilter::OutOfBand {
                bands: VISION_BANDS,
                value: ValueColumn::ParameterValueRaw,
                location: WorkLocationColumn::Id,
            },
        )
        .with_lookup(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sttr_core::WindowPolicy;

    fn window() -> ReportWindow {
        let now = chrono_tz::America::Chicago
            .with_ymd_and_hms(2025, 6, 2, 10, 0, 0)
            .single()
            .unwrap();
        WindowPolicy::default().hourly(&now).unwrap()
    }

    fn render(trace: &TraceQuery) -> QuerySpec {
        trace
            .to_query_spec(&window(), &CatalogConfig::default())
            .unwrap()
    }

    #[test]
    fn test_default_traces() {
        let stations: Vec<String> = default_traces()
            .into_iter()
            .map(|t| t.failing_station)
            .collect();
        assert_eq!(stations, vec!["040", "050", "090"]);
    }

    #[test]
    fn test_counting_rules() {
        let traces = default_traces();

        let force = render(&traces[0]);
        assert!(force.sql.contains("SELECT COUNT(*) AS COUNT"));
        assert!(force.sql.contains("parameter_id = 2"));

        let twisting = render(&traces[1]);
        assert!(twisting.sql.contains("COUNT(DISTINCT GH.product_serial) AS COUNT"));
        assert!(twisting.sql.contains("result_status = 'FAIL'"));
    }

    #[test]
    fn test_vision_trace_carries_lookup_table() {
        let vision = render(&default_traces()[2]);

        assert!(vision
            .sql
            .contains("FROM main.adhoc.sttr_065_hmi_hairpin_naming_work_elements"));
        assert!(vision.sql.contains("Value Height Pin X"));
        assert!(!render(&default_traces()[0]).sql.contains("work_elements"));
    }

    #[test]
    fn test_join_chain_and_output_columns() {
        let spec = render(&default_traces()[1]);

        assert_eq!(spec.name, "trace_050_hairpin_origin");
        assert!(spec.sql.contains("ON NPR.product_serial = GH.scanned_child_serial"));
        assert!(spec.sql.contains("LEFT JOIN wire_spool"));
        assert!(spec.sql.contains("AS STTR_030_HAIRPIN_ORIGIN"));
        assert_eq!(spec.param(WINDOW_START), Some("2025-05-12 14:00"));
    }

    #[test]
    fn test_invalid_station_is_rejected() {
        let trace = TraceQuery::new(
            "04'0",
            CountingRule::AllRows,
            FailureFilter::ResultStatus("FAIL"),
        );
        let err = trace
            .to_query_spec(&window(), &CatalogConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTrace(_)));
    }
}
