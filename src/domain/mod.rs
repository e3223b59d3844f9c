// Domain layer: city models and ports (interfaces).

pub mod model;
pub mod ports;
