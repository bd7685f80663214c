// Domain layer: scaffolding models and the fetcher port. No filesystem logic here.

pub mod model;
pub mod ports;
