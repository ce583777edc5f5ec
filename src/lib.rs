// sysmoni library - public API

// Re-export error types
pub mod error;
pub use error::{Result, SysmoniError};

// Module declarations
pub mod commands;
pub mod config;
pub mod sampler;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use sampler::{Sample, Sampler, SamplerConfig, SamplingLoop};

// Initialize logging (stderr, warn unless RUST_LOG says otherwise)
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
}
