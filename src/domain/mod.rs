// Domain layer: object models and the storage port. No HTTP details here.

pub mod model;
pub mod ports;
