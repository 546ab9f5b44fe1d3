//! Configuration tree.

use serde::{Deserialize, Serialize};

/// Embedding pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of parallel queue consumers
    pub consumer_count: usize,
    /// Delay between child completion and parent aggregation, in
    /// milliseconds. Zero is valid for stores that read their own writes.
    pub parent_aggregation_delay_ms: u64,
    /// Bucket holding child-chunk payload files
    pub chunks_bucket: String,
    /// Bucket holding image inputs (status query heuristic)
    pub image_bucket: String,
    /// Progress table name
    pub progress_table: String,
    /// Chunk ingestion queue name
    pub chunk_queue: String,
    /// Object store backend: `memory` or `fs`
    pub object_store: String,
    /// Root directory of the `fs` object store
    pub object_store_root: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            consumer_count: 4,
            parent_aggregation_delay_ms: 100,
            chunks_bucket: "rag-chunks".to_owned(),
            image_bucket: "image-input".to_owned(),
            progress_table: "embedding-progress".to_owned(),
            chunk_queue: "embedding-chunks-index".to_owned(),
            object_store: "memory".to_owned(),
            object_store_root: "./data/objects".to_owned(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Backend: `memory` or `postgres`
    pub provider: String,
    /// Postgres connection URL (required for the `postgres` backend)
    pub postgres_url: Option<String>,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: "memory".to_owned(),
            postgres_url: None,
            max_connections: 5,
        }
    }
}

/// Embedding endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingEndpointConfig {
    /// Provider: `hash` (deterministic local) or `http`
    pub provider: String,
    /// Endpoint URL for the `http` provider
    pub endpoint: Option<String>,
    /// Model identifier
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: Option<String>,
    /// Vector dimensionality
    pub dimensions: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingEndpointConfig {
    fn default() -> Self {
        Self {
            provider: "hash".to_owned(),
            endpoint: None,
            model: "text-embedding-3-small".to_owned(),
            api_key_env: None,
            dimensions: 1536,
            timeout_secs: 60,
        }
    }
}

/// QA summary endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Provider: `local` (template) or `http`
    pub provider: String,
    /// Chat endpoint URL for the `http` provider
    pub endpoint: Option<String>,
    /// Model identifier
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: Option<String>,
    /// Name of the secret carrying the LLM endpoint map
    pub endpoints_secret: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_owned(),
            endpoint: None,
            model: "gpt-4o-mini".to_owned(),
            api_key_env: None,
            endpoints_secret: None,
            timeout_secs: 60,
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick interval in seconds
    pub tick_interval_secs: u64,
    /// Timezone used when a task has none
    pub default_timezone: String,
    /// Task table name
    pub tasks_table: String,
    /// Bucket holding execution-log detail payloads
    pub logs_bucket: String,
    /// Agent queue name
    pub agent_queue: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            default_timezone: "America/Chicago".to_owned(),
            tasks_table: "scheduled-tasks".to_owned(),
            logs_bucket: "scheduled-tasks-logs".to_owned(),
            agent_queue: "agent-queue".to_owned(),
        }
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_owned(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`)
    pub level: String,
    /// Emit JSON log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Embedding pipeline settings
    pub pipeline: PipelineConfig,
    /// Vector store settings
    pub vector_store: VectorStoreConfig,
    /// Embedding endpoint settings
    pub embedding: EmbeddingEndpointConfig,
    /// QA summary settings
    pub qa: QaConfig,
    /// Scheduler settings
    pub scheduler: SchedulerConfig,
    /// HTTP surface settings
    pub server: ServerConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}
