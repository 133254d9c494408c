/// Report building for the address grouping service.
///
/// Submodules:
/// - `groupings` — groups validated records by state and renders the
///   ordered, human-readable report.

pub mod groupings;
