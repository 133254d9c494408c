//! Input ingestion for the address grouping service.
//!
//! Submodules:
//! - `record` — turns one raw `"Name, Street, City STATE"` item into a
//!   validated `PersonRecord`.

pub mod record;
