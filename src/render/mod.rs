// Rendering: charts, dashboard page, CSV tables and the zip bundle.

pub mod bundle;
pub mod charts;
pub mod dashboard;
pub mod summary;
pub mod tables;
