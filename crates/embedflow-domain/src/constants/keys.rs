//! Well-known metadata and attribute key names.

/// Object metadata key carrying the canonical document id.
pub const METADATA_KEY_OBJECT_KEY: &str = "object_key";

/// Object metadata key requesting a forced reprocess.
pub const METADATA_KEY_FORCE_REPROCESS: &str = "force_reprocess";

/// Suffix of child-chunk payload files.
pub const CHUNK_FILE_SUFFIX: &str = ".chunks.json";

/// Prefix applied to content-addressed global document ids.
pub const GLOBAL_ID_PREFIX: &str = "global/";
