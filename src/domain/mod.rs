// Domain layer: review models and ports. No HTTP or platform details here.

pub mod model;
pub mod ports;
