//! CLI command implementations

pub mod catalog;
pub mod post;
pub mod run;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Parse `--at`, defaulting to the current time
pub fn resolve_now(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(at) => Ok(DateTime::parse_from_rfc3339(at)
            .with_context(|| format!("--at must be an RFC 3339 timestamp, got '{}'", at))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_resolve_now() {
        let now = resolve_now(Some("2025-06-02T15:10:00-05:00")).unwrap();
        assert_eq!(now.hour(), 20);

        assert!(resolve_now(Some("yesterday")).is_err());
        assert!(resolve_now(None).is_ok());
    }
}
