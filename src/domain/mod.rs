// Domain layer: core models, ports and registry rules. No I/O here.

pub mod model;
pub mod personal_number;
pub mod ports;
pub mod requests;
pub mod result_code;
