//! CSV rendering of alert reports.
//!
//! ```text
//! Station,Severity,Message,Date,Status
//! "Jaipur Desert Monitor","Critical","Water table dropped ...","2025-01-15","Active"
//! ```
//!
//! Every field is double-quoted; quotes inside a field are doubled. The
//! header line always ends with a newline, data rows are newline-separated.

use crate::models::Alert;

pub const CSV_HEADER: &str = "Station,Severity,Message,Date,Status";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render one alert as a CSV row (no trailing newline).
pub fn alert_row(alert: &Alert) -> String {
    [
        alert.station_name.as_str(),
        alert.severity.as_str(),
        alert.message.as_str(),
        alert.date.as_str(),
        alert.status_label(),
    ]
    .iter()
    .map(|field| quote(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Render the full alerts report.
pub fn alerts_csv(alerts: &[Alert]) -> String {
    let rows: Vec<String> = alerts.iter().map(alert_row).collect();
    format!("{CSV_HEADER}\n{}", rows.join("\n"))
}
