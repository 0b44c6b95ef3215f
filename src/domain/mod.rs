// Domain layer: card validation, gateway models and ports.

pub mod card;
pub mod model;
pub mod ports;
