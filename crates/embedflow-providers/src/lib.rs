//! # Provider Layer
//!
//! Adapter implementations of the domain ports: coordination stores,
//! vector store gateways, object stores, queues, embedding services, API
//! key resolution, key translation, and mail delivery.
//!
//! In-memory adapters are the defaults (development and tests); external
//! backends are feature-gated per concern.

/// API key resolution providers
pub mod api_keys;
/// Shared provider constants
pub mod constants;
/// Coordination stores (progress records, task registry)
pub mod coordination;
/// Embedding, QA summary, and secrets providers
pub mod embedding;
/// Mail delivery providers
pub mod mailer;
/// Object store providers
pub mod object_store;
/// Queue providers
pub mod queue;
/// Key translation providers
pub mod translate;
/// Vector store gateways
pub mod vector_store;
