//! Report windows and the shift-summary schedule
//!
//! A run reports on a window ending at the current hour. The hourly window
//! always runs; the shift-summary window is added when the local hour falls
//! into one of the configured end-of-shift slots. All timestamps are
//! truncated to the hour and expressed in the plant's local timezone.

use crate::{Error, Result};
use chrono::{DateTime, Duration, DurationRound, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Timestamp format bound into queries and shown in headers
pub const WINDOW_FORMAT: &str = "%Y-%m-%d %H:00";

/// Default lookback of the hourly window.
///
/// Kept at the value production has been running with; see DESIGN.md.
pub const DEFAULT_HOURLY_LOOKBACK_HOURS: i64 = 500;

/// Default lookback of the shift-summary window
pub const DEFAULT_SUMMARY_LOOKBACK_HOURS: i64 = 8;

/// Plant timezone
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Chicago;

/// Which report group a window belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Hourly,
    ShiftSummary,
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowKind::Hourly => write!(f, "hourly"),
            WindowKind::ShiftSummary => write!(f, "shift_summary"),
        }
    }
}

/// A time window one query set is evaluated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindow {
    pub kind: WindowKind,
    /// Exclusive lower bound on record timestamps
    pub start: DateTime<Tz>,
    /// The run's current hour
    pub end: DateTime<Tz>,
    pub lookback_hours: i64,
}

impl ReportWindow {
    /// Window start as bound into queries
    pub fn start_param(&self) -> String {
        self.start.format(WINDOW_FORMAT).to_string()
    }

    /// Header line of the failure-by-parameter section
    pub fn header(&self) -> String {
        match self.kind {
            WindowKind::Hourly => format!(
                "*🚨Fail count by Parameter:* {} to {}",
                self.start_param(),
                (self.start + Duration::hours(1)).format("%H:00")
            ),
            WindowKind::ShiftSummary => format!(
                "*Fail count by Parameter:* {} to {}",
                self.start_param(),
                self.end.format(WINDOW_FORMAT)
            ),
        }
    }
}

/// How windows are derived from the current time
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPolicy {
    pub timezone: Tz,
    pub hourly_lookback_hours: i64,
    pub summary_lookback_hours: i64,
    /// Half-open `[from, to)` local-hour ranges that trigger a shift summary
    pub summary_hours: Vec<(u32, u32)>,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            hourly_lookback_hours: DEFAULT_HOURLY_LOOKBACK_HOURS,
            summary_lookback_hours: DEFAULT_SUMMARY_LOOKBACK_HOURS,
            summary_hours: vec![(5, 6), (15, 16)],
        }
    }
}

impl WindowPolicy {
    /// Validate lookbacks and summary slots
    pub fn validate(&self) -> Result<()> {
        if self.hourly_lookback_hours <= 0 {
            return Err(Error::InvalidWindow(
                "hourly lookback must be positive".to_string(),
            ));
        }
        if self.summary_lookback_hours <= 0 {
            return Err(Error::InvalidWindow(
                "summary lookback must be positive".to_string(),
            ));
        }
        for &(from, to) in &self.summary_hours {
            if from >= to || to > 24 {
                return Err(Error::InvalidWindow(format!(
                    "summary hours [{}, {}) are not a valid range",
                    from, to
                )));
            }
        }
        Ok(())
    }

    /// Convert any instant into the plant timezone, truncated to the hour
    pub fn local_hour<T: TimeZone>(&self, now: &DateTime<T>) -> Result<DateTime<Tz>> {
        // Truncate the instant, not the wall clock: the repeated hour of a
        // DST fall-back has no unique local 01:00.
        let local = now.with_timezone(&self.timezone);
        local
            .clone()
            .duration_trunc(Duration::hours(1))
            .map_err(|e| Error::InvalidWindow(format!("cannot truncate {} to the hour: {}", local, e)))
    }

    /// True when the local hour falls into a shift-summary slot
    pub fn is_shift_summary_hour(&self, hour: u32) -> bool {
        self.summary_hours
            .iter()
            .any(|&(from, to)| from <= hour && hour < to)
    }

    /// The hourly window ending at `now`
    pub fn hourly<T: TimeZone>(&self, now: &DateTime<T>) -> Result<ReportWindow> {
        self.window(WindowKind::Hourly, self.hourly_lookback_hours, now)
    }

    /// The shift-summary window ending at `now`, if `now` is a summary hour
    pub fn shift_summary<T: TimeZone>(&self, now: &DateTime<T>) -> Result<Option<ReportWindow>> {
        let end = self.local_hour(now)?;
        if !self.is_shift_summary_hour(end.hour()) {
            return Ok(None);
        }
        self.window(WindowKind::ShiftSummary, self.summary_lookback_hours, now)
            .map(Some)
    }

    fn window<T: TimeZone>(
        &self,
        kind: WindowKind,
        lookback_hours: i64,
        now: &DateTime<T>,
    ) -> Result<ReportWindow> {
        let end = self.local_hour(now)?;
        Ok(ReportWindow {
            kind,
            start: end.clone() - Duration::hours(lookback_hours),
            end,
            lookback_hours,
        })
    }
}
