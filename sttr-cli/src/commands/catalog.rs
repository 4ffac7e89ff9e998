//! Catalog command
//!
//! Prints every query of one window with its bound parameters, in the order
//! a run executes them.

use crate::config::Settings;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::fmt::Write as _;
use sttr_core::{Catalog, CatalogConfig, QuerySpec, ReportWindow};
use sttr_lineage::default_traces;

/// Which window to render queries for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum WindowChoice {
    #[default]
    Hourly,
    Summary,
}

pub fn execute(settings: &Settings, choice: WindowChoice, at: Option<&str>) -> Result<()> {
    let now = super::resolve_now(at)?;
    let policy = settings.window_policy()?;

    let window = match choice {
        WindowChoice::Hourly => policy.hourly(&now)?,
        WindowChoice::Summary => match policy.shift_summary(&now)? {
            Some(window) => window,
            None => bail!(
                "{} is not a shift-summary hour in {}; pass --at",
                policy.local_hour(&now)?.format("%Y-%m-%d %H:00"),
                policy.timezone
            ),
        },
    };

    let queries = window_queries(&CatalogConfig::default(), &window)?;
    print!("{}", render_catalog(&queries));
    Ok(())
}

/// Failure queries, the override query and the traces, in run order
pub fn window_queries(config: &CatalogConfig, window: &ReportWindow) -> Result<Vec<QuerySpec>> {
    let catalog = Catalog::new(config.clone());
    let mut queries = catalog.failure_queries(window);
    queries.push(catalog.override_query(window));
    for trace in default_traces() {
        queries.push(trace.to_query_spec(window, catalog.config())?);
    }
    Ok(queries)
}

pub fn render_catalog(queries: &[QuerySpec]) -> String {
    let mut out = String::new();
    for query in queries {
        let _ = writeln!(out, "-- {} (station {})", query.name, query.station);
        for param in &query.params {
            let _ = writeln!(out, "--   :{} = '{}'", param.name, param.value);
        }
        let _ = writeln!(out, "{};\n", query.sql);
    }
    out
}
