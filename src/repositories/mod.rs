pub mod mapping_repo;
pub mod risk_repo;

pub use mapping_repo::{MappingRepository, SqlxMappingRepository};
pub use risk_repo::{RiskRepository, SqlxRiskRepository};
