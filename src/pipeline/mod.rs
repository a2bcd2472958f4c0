//! Pure transformations over fetched collections.
//!
//! - `filter`: station search/filter and alert filter/sort
//! - `stats`: dashboard summary figures
//! - `report`: CSV export of alerts

pub mod filter;
pub mod report;
pub mod stats;

pub use filter::{
    ALL, AlertFilter, Resolution, StationFilter, filter_alerts, filter_stations, parse_choice,
    parse_region,
};
pub use report::alerts_csv;
pub use stats::{AlertStats, StationStats, regions};
