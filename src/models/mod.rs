pub mod mapping;
pub mod risk;

// Re-export commonly used types
pub use mapping::*;
pub use risk::*;
