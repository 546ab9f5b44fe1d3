//! Vector store gateways.

/// In-memory gateway
#[cfg(feature = "vectorstore-memory")]
pub mod memory;
/// Postgres gateway
#[cfg(feature = "vectorstore-postgres")]
pub mod postgres;

#[cfg(feature = "vectorstore-memory")]
pub use memory::InMemoryVectorStore;
#[cfg(feature = "vectorstore-postgres")]
pub use postgres::PostgresVectorStore;
