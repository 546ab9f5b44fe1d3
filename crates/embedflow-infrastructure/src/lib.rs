//! # Infrastructure Layer
//!
//! Configuration loading and validation, tracing setup, the in-process
//! event bus, the runtime loops (queue consumer pool, scheduler timer),
//! and the application context that wires providers to use cases.

/// Configuration loading and validation
pub mod config;
/// Application context wiring
pub mod context;
/// In-process event bus
pub mod events;
/// Tracing initialization
pub mod logging;
/// Runtime loops
pub mod runtime;

pub use config::{AppConfig, ConfigLoader};
pub use context::AppContext;
pub use events::BroadcastEventBus;
