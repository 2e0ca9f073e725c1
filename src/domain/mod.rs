// Domain layer: capture models and ports (storage, browser sessions).

pub mod model;
pub mod ports;
pub mod settings;
