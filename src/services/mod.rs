pub mod mapping_service;
pub mod risk_service;

// Re-export commonly used types
pub use mapping_service::{builtin_catalogue, MappingService};
pub use risk_service::RiskService;
