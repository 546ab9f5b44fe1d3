//! Embedding provider defaults.

/// Default embedding dimensionality when none is configured.
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// System prompt for the QA summary call: expand a chunk into the
/// questions it answers, improving question-form retrieval.
pub const QA_SYSTEM_PROMPT: &str = "You expand document passages into the \
questions they answer. Given a passage, respond with a short list of \
natural-language questions a reader could answer using only that passage. \
Respond with the questions only, one per line.";
