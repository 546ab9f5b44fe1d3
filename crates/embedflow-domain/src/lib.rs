//! # Domain Layer
//!
//! Core business logic and domain types for the document-embedding pipeline
//! and the scheduled-task scheduler. Contains only pure domain entities,
//! value objects, status machines, and port interfaces.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`entities`] | Progress records, embedding rows, scheduled tasks |
//! | [`value_objects`] | Strong-typed keys and embedding vectors |
//! | [`ports`] | Provider port interfaces and service contracts |
//! | [`constants`] | Domain constants and shared limits |
//! | [`error`] | Domain error types |
//!
//! ## Clean Architecture Principles
//!
//! - **Entities** carry the business rules (legal status transitions,
//!   parent aggregation, log-entry merge semantics)
//! - **Ports** abstract every external collaborator (stores, queues,
//!   embedding services, mailers) behind `async` traits
//! - **No infrastructure concerns** - adapters live in `embedflow-providers`

/// Common macros
#[macro_use]
pub mod macros;

/// Domain-level constants
pub mod constants;
/// Core business entities
pub mod entities;
/// Domain error types
pub mod error;
/// Domain events and event bus port
pub mod events;
/// External provider port interfaces
pub mod ports;
/// Common utilities
pub mod utils;
/// Immutable value objects
pub mod value_objects;

// Re-export commonly used types for convenience
pub use entities::*;
pub use error::{Error, Result};
pub use events::{DomainEvent, DomainEventStream, EventBusProvider};
pub use value_objects::*;
