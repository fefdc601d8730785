// Domain layer: row models and ports (interfaces) for the collaborators around the transformer.

pub mod model;
pub mod ports;
