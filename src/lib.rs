//! Fleet logistics analytics
//!
//! Turns raw load, fuel and expense spreadsheet rows into lane and
//! financial summaries for the dashboard.

pub mod api;
pub mod columns;
pub mod config;
pub mod finance;
pub mod ingest;
pub mod kpi;
pub mod lanes;
pub mod models;
pub mod normalize;
pub mod rows;
pub mod selectors;
pub mod state;
