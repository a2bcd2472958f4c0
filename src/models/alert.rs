// src/models/alert.rs

//! Alert data structure.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Self::Critical, Self::Warning, Self::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::validation(format!("Unknown severity '{s}'")))
    }
}

/// An alert raised for a station.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    /// Unique alert identifier
    pub id: String,

    /// Owning station
    pub station_id: String,

    /// Station name copied when the alert was created.
    ///
    /// Not kept in sync with the station record and may drift from it.
    pub station_name: String,

    pub severity: Severity,

    /// Free-text message
    pub message: String,

    /// Calendar date (YYYY-MM-DD)
    pub date: String,

    #[serde(rename = "is_resolved")]
    pub resolved: bool,
}

impl Alert {
    /// Parse the alert date.
    ///
    /// Accepts a bare calendar date or a full RFC 3339 timestamp.
    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(&self.date)
                    .ok()
                    .map(|ts| ts.date_naive())
            })
    }

    /// Status label used in reports.
    pub fn status_label(&self) -> &'static str {
        if self.resolved { "Resolved" } else { "Active" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_alert(date: &str) -> Alert {
        Alert {
            id: "AL001".to_string(),
            station_id: "ST003".to_string(),
            station_name: "Jaipur Desert Monitor".to_string(),
            severity: Severity::Critical,
            message: "Water table dropped below 9m threshold".to_string(),
            date: date.to_string(),
            resolved: false,
        }
    }

    #[test]
    fn test_day_parsing() {
        assert_eq!(
            sample_alert("2025-01-15").day(),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(
            sample_alert("2025-01-15T23:10:00Z").day(),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(sample_alert("yesterday").day(), None);
    }

    #[test]
    fn test_resolved_wire_name() {
        let mut alert = sample_alert("2025-01-15");
        alert.resolved = true;

        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["is_resolved"], true);
        assert!(value.get("resolved").is_none());
        assert_eq!(alert.status_label(), "Resolved");
    }

    #[test]
    fn test_severity_display_padding() {
        assert_eq!(format!("[{:<8}]", Severity::Info), "[Info    ]");
        assert_eq!(format!("{:^9}", Severity::Warning), " Warning ");
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("all".parse::<Severity>().is_err());
    }
}
