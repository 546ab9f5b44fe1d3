//! Chunk payloads and the queue event envelope.
//!
//! One queue message carries one object-store event; the referenced object
//! is a child-chunk payload produced by the external chunker.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// One local micro-chunk: one embedding row's worth of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalChunk {
    /// Raw chunk text
    pub content: String,
    /// Opaque location data from the chunker
    #[serde(default)]
    pub locations: Value,
    /// Opaque index data from the chunker
    #[serde(default)]
    pub indexes: Value,
    /// Character offset of the chunk within the document
    #[serde(default)]
    pub char_index: i64,
}

/// Child-chunk payload file: the document source plus an ordered sequence
/// of local micro-chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Source key of the document
    pub src: String,
    /// Local micro-chunks in input order
    #[serde(default)]
    pub chunks: Vec<LocalChunk>,
}

/// Decoded reference to an object in the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Bucket name
    pub bucket: String,
    /// Object key, percent-decoded
    pub key: String,
}

/// Standard object-store event envelope carried in a queue message body.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreEvent {
    /// Event records; only the first is meaningful here
    #[serde(rename = "Records", default)]
    pub records: Vec<ObjectStoreEventRecord>,
}

/// One record within the event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreEventRecord {
    /// Object-store entity of the record
    pub s3: S3Entity,
}

/// Bucket/object pair of an event record.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    /// Bucket descriptor
    pub bucket: BucketDescriptor,
    /// Object descriptor
    pub object: ObjectDescriptor,
}

/// Bucket name wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct BucketDescriptor {
    /// Bucket name
    pub name: String,
}

/// Object key wrapper. Keys arrive URL-encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDescriptor {
    /// URL-encoded object key
    pub key: String,
}

impl ObjectStoreEvent {
    /// Parse an envelope from a raw queue message body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a valid envelope.
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Bucket and percent-decoded key of the first record.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope carries no records or the key is
    /// not valid UTF-8 after decoding.
    pub fn first_object(&self) -> Result<ObjectRef> {
        let record = self
            .records
            .first()
            .ok_or_else(|| Error::invalid_argument("event envelope carries no records"))?;
        let key = percent_decode_str(&record.s3.object.key)
            .decode_utf8()
            .map_err(|e| Error::invalid_argument(format!("object key is not UTF-8: {e}")))?
            .into_owned();
        Ok(ObjectRef {
            bucket: record.s3.bucket.name.clone(),
            key,
        })
    }
}
