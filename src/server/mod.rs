//! Server module for RAiDesk
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Configuration validation
//! - `shutdown`: Signal handling
//! - `init`: Server initialization and run loop

pub mod config;
mod init;
mod loader;
mod shutdown;
mod validation;

pub use init::run;
pub use loader::load_config;
pub use validation::validate_config;
