// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod alert;
mod config;
mod station;
mod user;

// Re-export all public types
pub use alert::{Alert, Severity};
pub use config::{
    API_URL_ENV, ApiConfig, CacheConfig, Config, FallbackConfig, FallbackMode, LoggingConfig,
};
pub use station::{Station, StationStatus, Trend, WaterLevel, sort_chronologically};
pub use user::{AuthSession, Credentials, Registration, Role, User};
