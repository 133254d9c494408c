//! Address grouping service.
//!
//! Parses batches of `"Name, Street Address, City STATE"` strings and
//! renders them as a report grouped by state.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod server;
pub mod service;
pub mod states;
