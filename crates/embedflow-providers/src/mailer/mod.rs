//! Mail delivery providers.

/// Log-only mailer
pub mod log;

pub use log::LogMailer;
