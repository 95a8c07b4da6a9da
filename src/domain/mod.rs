// Domain layer: page model and ports. No I/O here.

pub mod model;
pub mod page;
pub mod ports;
