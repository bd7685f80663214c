pub mod cancel;
pub mod error;
pub mod fs;
pub mod logger;
pub mod validation;
