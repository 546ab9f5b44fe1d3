//! Configuration loading and validation.

/// Configuration tree
pub mod data;
/// Figment-based loader
pub mod loader;
/// Load-time validation
pub mod validation;

pub use data::{
    AppConfig, EmbeddingEndpointConfig, LoggingConfig, PipelineConfig, QaConfig,
    SchedulerConfig, ServerConfig, VectorStoreConfig,
};
pub use loader::ConfigLoader;
