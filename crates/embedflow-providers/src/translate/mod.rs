//! Key translation providers.

/// Content-addressed hash translator
pub mod hash;

pub use hash::HashKeyTranslator;
