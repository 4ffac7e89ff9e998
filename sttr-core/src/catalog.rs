//! Query catalog for the per-station failure counts
//!
//! Each station of interest has one query returning rows shaped
//! `(COUNT, STATION_NAME, PARAMETER_NAME | ALARM_DESCRIPTION)`. Queries are
//! data: SQL text with named parameter markers plus the values bound to
//! them. Every query of one window binds the same `:window_start` value.

use crate::tolerance::{
    bands_predicate, ValueColumn, WorkLocationColumn, END_OF_LINE_BANDS, VISION_BANDS,
};
use crate::window::ReportWindow;
use serde::{Deserialize, Serialize};

/// Station whose pareto total is replaced by a distinct-serial count
pub const OVERRIDE_STATION: &str = "210";

/// Named parameter marker for the window start
pub const WINDOW_START: &str = "window_start";

/// A named parameter bound to a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl QueryParam {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            type_name: "STRING".to_string(),
        }
    }
}

/// One catalog query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Stable name, used for logging and test lookups
    pub name: String,
    /// Station the query reports on
    pub station: String,
    /// SQL text with `:name` parameter markers
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl QuerySpec {
    pub fn new(name: impl Into<String>, station: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            station: station.into(),
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: QueryParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = QueryParam>) -> Self {
        self.params.extend(params);
        self
    }

    /// Look up a bound parameter value
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Plant-specific identifiers the catalog is rendered against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub shop: String,
    pub line: String,
    /// SCADA alarm fact table (identifiers cannot be bound)
    pub alarm_table: String,
    /// Work-element naming table read by the station 090 lineage trace
    pub lookup_table: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            shop: "DU03".to_string(),
            line: "STTR01".to_string(),
            alarm_table: "manufacturing.drive_unit.fct_du03_scada_alarms".to_string(),
            lookup_table: "main.adhoc.sttr_065_hmi_hairpin_naming_work_elements".to_string(),
        }
    }
}

/// Catalog of failure queries for one plant configuration
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    config: CatalogConfig,
}

impl Catalog {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Parameters shared by every query of a window
    pub fn common_params(&self, window: &ReportWindow) -> Vec<QueryParam> {
        vec![
            QueryParam::string(WINDOW_START, window.start_param()),
            QueryParam::string("shop", &self.config.shop),
            QueryParam::string("line", &self.config.line),
        ]
    }

    /// Per-station failure queries, in report order
    pub fn failure_queries(&self, window: &ReportWindow) -> Vec<QuerySpec> {
        let params = self.common_params(window);
        vec![
            self.station_020(),
            self.station_040(),
            self.station_050(),
            self.station_070(),
            self.station_090(),
            self.station_100(),
            self.station_180(),
        ]
        .into_iter()
        .map(|spec| spec.with_params(params.clone()))
        .collect()
    }

    /// Distinct-serial failure count for [`OVERRIDE_STATION`]
    pub fn override_query(&self, window: &ReportWindow) -> QuerySpec {
        let sql = format!(
            "SELECT COUNT(DISTINCT product_serial) AS COUNT, STATION_NAME
    FROM manufacturing.spinal.fct_spinal_parameter_records
    WHERE line_name = :line
    AND STATION_NAME = '{station}'
    AND overall_process_status = 'NOK'
    AND recorded_at > :window_start
    AND {bands}
    GROUP BY STATION_NAME",
            station = OVERRIDE_STATION,
            bands = bands_predicate(
                END_OF_LINE_BANDS,
                ValueColumn::ParameterValueNum,
                WorkLocationColumn::Name
            ),
        );

        QuerySpec::new("station_210_unique_serials", OVERRIDE_STATION, sql)
            .with_params(self.common_params(window))
    }

    fn station_020(&self) -> QuerySpec {
        QuerySpec::new(
            "station_020_work_location_jobs",
            "020",
            "SELECT COUNT(DISTINCT product_serial) AS COUNT, STATION_NAME, work_location_desc AS PARAMETER_NAME
    FROM manufacturing.mes.fct_work_location_jobs
    WHERE shop_name = :shop
    AND line_name = :line
    AND station_name = '020'
    AND started_at > :window_start
    AND job_status != 'OK'
    GROUP BY station_name, work_location_desc",
        )
    }

    fn station_040(&self) -> QuerySpec {
        QuerySpec::new(
            "station_040_force",
            "040",
            "SELECT COUNT(DISTINCT product_serial) AS COUNT, STATION_NAME, PARAMETER_NAME
    FROM manufacturing.spinal.fct_spinal_parameter_records
    WHERE shop_name = :shop
    AND line_name = :line
    AND STATION_NAME = '040'
    AND PARAMETER_NAME = 'Force process value'
    AND parameter_id = 2
    AND overall_process_status = 'NOK'
    AND recorded_at > :window_start
    GROUP BY STATION_NAME, PARAMETER_NAME",
        )
    }

    fn station_050(&self) -> QuerySpec {
        // An activation counts once unless it re-fires within 30s of the
        // previous clear on the same source.
        let sql = format!(
            "WITH alarm_data AS (
        SELECT *,
            LAG(cleared_at) OVER (PARTITION BY alarm_source_scada_short_name ORDER BY activated_at) AS prev_cleared_at
        FROM {table}
        WHERE alarm_source_scada_short_name ILIKE CONCAT('%', :line, '-050%')
        AND CONVERT_TIMEZONE('UTC', 'America/Chicago', activated_at) > :window_start
        AND alarm_priority_desc IN ('high', 'critical')
    )
    SELECT COUNT(*) AS COUNT, '050' AS STATION_NAME, 'Twisting Check Plate Fails' AS PARAMETER_NAME
    FROM alarm_data
    WHERE (activated_at > prev_cleared_at + INTERVAL '30 seconds' OR prev_cleared_at IS NULL)
    AND alarm_description ILIKE '%Assembly error%Task[301]%'
    UNION ALL
    SELECT COUNT(*) AS COUNT, '050' AS STATION_NAME,
        TRIM(BOTH ' []' FROM SPLIT_PART(alarm_description, 'Key', 2)) AS PARAMETER_NAME
    FROM alarm_data
    WHERE alarm_description ILIKE '%Gripper%work%'
    GROUP BY PARAMETER_NAME",
            table = self.config.alarm_table,
        );
        QuerySpec::new("station_050_alarms", "050", sql)
    }

    fn station_070(&self) -> QuerySpec {
        let sql = format!(
            "SELECT COUNT(*) AS COUNT, '070' AS STATION_NAME, 'Bad Cuts/Welding Fail' AS ALARM_DESCRIPTION
    FROM {table}
    WHERE alarm_source_scada_short_name ILIKE CONCAT('%', :line, '-070%')
    AND CONVERT_TIMEZONE('UTC', 'America/Chicago', activated_at) > :window_start
    AND alarm_priority_desc IN ('high', 'critical')
    AND alarm_description ILIKE '%Assembly error%'
    GROUP BY STATION_NAME",
            table = self.config.alarm_table,
        );
        QuerySpec::new("station_070_alarms", "070", sql)
    }

    fn station_090(&self) -> QuerySpec {
        let sql = format!(
            "SELECT COUNT(DISTINCT product_serial) AS COUNT, STATION_NAME, PARAMETER_NAME
    FROM manufacturing.spinal.fct_spinal_parameter_records
    WHERE shop_name = :shop
    AND line_name = :line
    AND STATION_NAME = '090'
    AND recorded_at > :window_start
    AND {bands}
    GROUP BY STATION_NAME, PARAMETER_NAME
    ORDER BY COUNT DESC",
            bands = bands_predicate(
                VISION_BANDS,
                ValueColumn::ParameterValueRaw,
                WorkLocationColumn::Id
            ),
        );
        QuerySpec::new("station_090_vision", "090", sql)
    }

    fn station_100(&self) -> QuerySpec {
        QuerySpec::new(
            "station_100_nok",
            "100",
            "SELECT COUNT(DISTINCT product_serial) AS COUNT, STATION_NAME, PARAMETER_NAME
    FROM manufacturing.spinal.fct_spinal_parameter_records
    WHERE shop_name = :shop
    AND line_name = :line
    AND STATION_NAME = '100'
    AND overall_process_status = 'NOK'
    AND recorded_at > :window_start
    GROUP BY STATION_NAME, PARAMETER_NAME
    ORDER BY COUNT DESC",
        )
    }

    fn station_180(&self) -> QuerySpec {
        let sql = format!(
            "SELECT COUNT(DISTINCT product_serial) AS COUNT, STATION_NAME, PARAMETER_NAME
    FROM manufacturing.spinal.fct_spinal_parameter_records
    WHERE shop_name = :shop
    AND line_name = :line
    AND STATION_NAME = '180'
    AND overall_process_status = 'NOK'
    AND recorded_at > :window_start
    AND {bands}
    GROUP BY STATION_NAME, PARAMETER_NAME
    ORDER BY COUNT DESC",
            bands = bands_predicate(
                END_OF_LINE_BANDS,
                ValueColumn::ParameterValueNum,
                WorkLocationColumn::Id
            ),
        );
        QuerySpec::new("station_180_end_of_line", "180", sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowPolicy;
    use chrono::TimeZone;

    fn window() -> ReportWindow {
        let now = chrono_tz::America::Chicago
            .with_ymd_and_hms(2025, 6, 2, 15, 20, 0)
            .single()
            .unwrap();
        WindowPolicy::default().shift_summary(&now).unwrap().unwrap()
    }

    #[test]
    fn test_failure_queries_cover_every_station_in_order() {
        let catalog = Catalog::default();
        let stations: Vec<String> = catalog
            .failure_queries(&window())
            .into_iter()
            .map(|q| q.station)
            .collect();

        assert_eq!(stations, vec!["020", "040", "050", "070", "090", "100", "180"]);
    }

    #[test]
    fn test_all_queries_share_the_window_start() {
        let catalog = Catalog::default();
        let window = window();
        let mut queries = catalog.failure_queries(&window);
        queries.push(catalog.override_query(&window));

        for query in &queries {
            assert_eq!(query.param(WINDOW_START), Some("2025-06-02 07:00"), "{}", query.name);
            assert!(query.sql.contains(":window_start"), "{}", query.name);
        }
    }

    #[test]
    fn test_timestamps_are_never_interpolated() {
        let catalog = Catalog::default();
        for query in catalog.failure_queries(&window()) {
            assert!(!query.sql.contains("2025-06-02"), "{}", query.name);
        }
    }

    #[test]
    fn test_query_names_are_unique() {
        let catalog = Catalog::default();
        let window = window();
        let mut names: Vec<String> = catalog
            .failure_queries(&window)
            .into_iter()
            .map(|q| q.name)
            .collect();
        names.push(catalog.override_query(&window).name);

        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_band_queries_embed_their_limits() {
        let catalog = Catalog::default();
        let queries = catalog.failure_queries(&window());

        let vision = queries.iter().find(|q| q.station == "090").unwrap();
        assert!(vision.sql.contains("parameter_value_raw < 39 OR parameter_value_raw > 47"));

        let eol = queries.iter().find(|q| q.station == "180").unwrap();
        assert!(eol.sql.contains("work_location_id = 02"));

        let unique = catalog.override_query(&window());
        assert!(unique.sql.contains("work_location_name = '01'"));
        assert_eq!(unique.station, OVERRIDE_STATION);
    }

    #[test]
    fn test_alarm_table_comes_from_config() {
        let catalog = Catalog::new(CatalogConfig {
            alarm_table: "sandbox.alarms".to_string(),
            ..CatalogConfig::default()
        });
        let queries = catalog.failure_queries(&window());
        let alarms = queries.iter().find(|q| q.station == "070").unwrap();
        assert!(alarms.sql.contains("FROM sandbox.alarms"));
        assert!(alarms.sql.contains("ALARM_DESCRIPTION"));
    }

    #[test]
    fn test_query_param_serializes_type_field() {
        let json = serde_json::to_value(QueryParam::string("line", "STTR01")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "line", "value": "STTR01", "type": "STRING"})
        );
    }
}
