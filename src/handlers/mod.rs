pub mod health_handlers;
pub mod mapping_handlers;
pub mod risk_handlers;

pub use health_handlers::{health_check, healthz, liveness_check, readiness_check};
