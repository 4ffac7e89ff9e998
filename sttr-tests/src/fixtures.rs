//! Canned warehouse results and fixed clock times
//!
//! The scenario tables are what a typical afternoon on the line looks like:
//! every catalog query answers, one station reports nothing, and a few rows
//! carry zero counts that the report must drop.

use crate::builders::TableBuilder;
use crate::mocks::MockWarehouse;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::America::Chicago;
use sttr_core::Table;

/// 2025-06-02 at `hour`:00 plant time, as UTC
pub fn chicago(hour: u32) -> DateTime<Utc> {
    Chicago
        .with_ymd_and_hms(2025, 6, 2, hour, 0, 0)
        .single()
        .expect("unambiguous fixture time")
        .with_timezone(&Utc)
}

/// Per-query scenario tables, keyed by catalog query name
pub mod tables {
    use super::*;

    pub fn station_020_work_location_jobs() -> Table {
        TableBuilder::parameters()
            .failure(2, "020", "Hairpin insertion check")
            .build()
    }

    pub fn station_040_force() -> Table {
        TableBuilder::parameters()
            .failure(5, "040", "Force process value")
            .build()
    }

    pub fn station_050_alarms() -> Table {
        TableBuilder::alarms()
            .failure(4, "050", "Twisting Check Plate Fails")
            .failure(0, "050", "Gripper 3 Not Closed")
            .build()
    }

    pub fn station_070_alarms() -> Table {
        TableBuilder::alarms()
            .failure(3, "070", "Bad Cuts/Welding Fail")
            .build()
    }

    pub fn station_090_vision() -> Table {
        TableBuilder::parameters()
            .failure(6, "090", "Value Height Pin X")
            .failure(1, "090", "Value Angle 1 Pin X")
            .build()
    }

    pub fn station_100_nok() -> Table {
        TableBuilder::parameters().build()
    }

    pub fn station_180_end_of_line() -> Table {
        TableBuilder::parameters()
            .failure(2, "180", "Pdiv UV Value")
            .build()
    }

    pub fn station_210_unique_serials() -> Table {
        TableBuilder::unique_serials().total("210", 3).build()
    }

    pub fn trace_040_hairpin_origin() -> Table {
        TableBuilder::origins()
            .origin(2, "040", "030-2")
            .origin(5, "040", "030-1")
            .build()
    }

    pub fn trace_050_hairpin_origin() -> Table {
        TableBuilder::origins().origin(4, "050", "030-2").build()
    }

    pub fn trace_090_hairpin_origin() -> Table {
        TableBuilder::origins()
            .origin(2, "090", "030-1")
            .origin(0, "090", "030-3")
            .build()
    }
}

/// Every scenario table paired with its query name
pub fn scenario_tables() -> Vec<(&'static str, Table)> {
    vec![
        (
            "station_020_work_location_jobs",
            tables::station_020_work_location_jobs(),
        ),
        ("station_040_force", tables::station_040_force()),
        ("station_050_alarms", tables::station_050_alarms()),
        ("station_070_alarms", tables::station_070_alarms()),
        ("station_090_vision", tables::station_090_vision()),
        ("station_100_nok", tables::station_100_nok()),
        ("station_180_end_of_line", tables::station_180_end_of_line()),
        (
            "station_210_unique_serials",
            tables::station_210_unique_serials(),
        ),
        ("trace_040_hairpin_origin", tables::trace_040_hairpin_origin()),
        ("trace_050_hairpin_origin", tables::trace_050_hairpin_origin()),
        ("trace_090_hairpin_origin", tables::trace_090_hairpin_origin()),
    ]
}

/// A warehouse answering every query with its scenario table
pub fn scenario_warehouse() -> MockWarehouse {
    scenario_tables()
        .into_iter()
        .fold(MockWarehouse::new(), |warehouse, (name, table)| {
            warehouse.with_table(name, table)
        })
}
