pub mod cors;
pub mod logging;
pub mod security;

pub use cors::*;
pub use logging::*;
pub use security::*;
