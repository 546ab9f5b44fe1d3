//! External provider port interfaces and service contracts.

/// Compare-and-set primitives shared by the coordination ports
pub mod cas;
/// Provider ports (stores, queues, embedding services, mailer)
pub mod providers;
/// Service interfaces implemented by the application layer
pub mod services;

pub use cas::CasOutcome;
pub use providers::*;
pub use services::*;
