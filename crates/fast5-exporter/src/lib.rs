pub mod api;
pub mod app;
pub mod cmd;
pub mod config;
pub mod core;
pub mod metrics;
pub mod platform;
pub mod util;
