// src/lib.rs

//! DWLR Monitor Library
//!
//! Client core for a groundwater monitoring dashboard: a REST gateway that
//! falls back to offline data instead of failing, a local cache of the last
//! good station and alert collections, and the filters and views built on
//! top of them.

pub mod error;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
