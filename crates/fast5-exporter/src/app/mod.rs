//! Application module
//!
//! Structure and lifecycle of the `serve` daemon, organized into logical
//! sub-modules.

pub mod builder;
pub mod core;
pub mod services;
pub mod tasks;

// Re-export main types
pub use builder::ApplicationBuilder;
pub use self::core::Application;
pub use services::ApplicationServices;
