// Domain layer: models, ports (interfaces) and the pure inventory rules.
// Nothing here performs I/O.

pub mod model;
pub mod ports;

pub mod services;
