//! Application context: provider selection and use-case wiring.
//!
//! Providers are chosen by configuration, one implementation per port at
//! runtime, so wiring is an explicit builder rather than a plugin
//! registry.

use std::sync::Arc;
use std::time::Duration;

use embedflow_application::{
    EmbeddingWorker, EmbeddingWorkerDeps, ProgressCoordinator, ReprocessPlanner, SchedulerTick,
    StatusQueryService, TaskCallbackSink, TaskDispatcher,
};
use embedflow_domain::error::{Error, Result};
use embedflow_domain::events::EventBusProvider;
use embedflow_domain::ports::providers::{
    EmbeddingProvider, ObjectStoreProvider, ProgressStore, QaSummaryProvider, QueueProvider,
    SecretsProvider, TaskRepository, VectorStoreGateway,
};
use embedflow_domain::ports::services::StatusQueryInterface;
use embedflow_providers::api_keys::InMemoryApiKeyResolver;
use embedflow_providers::coordination::{InMemoryProgressStore, InMemoryTaskRepository};
use embedflow_providers::embedding::{
    HashEmbeddingProvider, HttpEmbeddingConfig, HttpEmbeddingProvider, HttpQaSummaryProvider,
    LocalQaSummaryProvider, QaEndpointConfig, StaticSecretsProvider,
};
use embedflow_providers::mailer::LogMailer;
use embedflow_providers::object_store::{FsObjectStore, InMemoryObjectStore};
use embedflow_providers::queue::InMemoryQueue;
use embedflow_providers::translate::HashKeyTranslator;
use embedflow_providers::vector_store::InMemoryVectorStore;
use tracing::info;

use crate::config::AppConfig;
use crate::events::BroadcastEventBus;

/// Everything the server binary needs, wired.
pub struct AppContext {
    /// Resolved configuration
    pub config: AppConfig,
    /// Chunk ingestion queue
    pub chunk_queue: Arc<dyn QueueProvider>,
    /// Agent execution queue
    pub agent_queue: Arc<dyn QueueProvider>,
    /// Object store
    pub object_store: Arc<dyn ObjectStoreProvider>,
    /// Progress coordination store
    pub progress_store: Arc<dyn ProgressStore>,
    /// Task registry
    pub task_repository: Arc<dyn TaskRepository>,
    /// Vector store gateway
    pub vector_store: Arc<dyn VectorStoreGateway>,
    /// Event bus
    pub event_bus: Arc<dyn EventBusProvider>,
    /// Progress coordinator
    pub coordinator: Arc<ProgressCoordinator>,
    /// Embedding worker
    pub worker: Arc<EmbeddingWorker>,
    /// Scheduler tick
    pub scheduler: Arc<SchedulerTick>,
    /// Status query service
    pub status_query: Arc<dyn StatusQueryInterface>,
    /// Task callback sink
    pub callback_sink: Arc<TaskCallbackSink>,
    /// API key table (concrete, for seeding)
    pub api_keys: Arc<InMemoryApiKeyResolver>,
    /// Mailer (concrete, for inspection)
    pub mailer: Arc<LogMailer>,
}

impl AppContext {
    /// Wire all providers and use cases from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown provider selections, unreachable
    /// backends, or a failed schema check.
    pub async fn build(config: AppConfig) -> Result<Self> {
        let event_bus: Arc<dyn EventBusProvider> = Arc::new(BroadcastEventBus::new());

        let object_store: Arc<dyn ObjectStoreProvider> =
            match config.pipeline.object_store.as_str() {
                "fs" => Arc::new(FsObjectStore::new(&config.pipeline.object_store_root)),
                _ => Arc::new(InMemoryObjectStore::new()),
            };

        let vector_store = build_vector_store(&config).await?;
        vector_store.ensure_schema().await?;

        let embedding = build_embedding_provider(&config)?;
        let qa = build_qa_provider(&config)?;
        let secrets: Arc<dyn SecretsProvider> =
            Arc::new(StaticSecretsProvider::new(serde_json::json!({})));

        let progress_store: Arc<dyn ProgressStore> = Arc::new(InMemoryProgressStore::new());
        let task_repository: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new(
            Arc::clone(&object_store),
            config.scheduler.logs_bucket.clone(),
        ));
        let chunk_queue: Arc<dyn QueueProvider> = Arc::new(InMemoryQueue::new());
        let agent_queue: Arc<dyn QueueProvider> = Arc::new(InMemoryQueue::new());

        let coordinator = Arc::new(ProgressCoordinator::new(
            Arc::clone(&progress_store),
            Arc::clone(&event_bus),
        ));
        let planner = Arc::new(ReprocessPlanner::new(
            Arc::clone(&progress_store),
            Arc::clone(&vector_store),
            Arc::clone(&object_store),
            config.pipeline.chunks_bucket.clone(),
        ));
        let worker = Arc::new(EmbeddingWorker::new(
            EmbeddingWorkerDeps {
                coordinator: Arc::clone(&coordinator),
                planner,
                vector_store: Arc::clone(&vector_store),
                object_store: Arc::clone(&object_store),
                embedding,
                qa,
                secrets,
                queue: Arc::clone(&chunk_queue),
                event_bus: Arc::clone(&event_bus),
            },
            Duration::from_millis(config.pipeline.parent_aggregation_delay_ms),
        ));

        let api_keys = Arc::new(InMemoryApiKeyResolver::new());
        let mailer = Arc::new(LogMailer::new());
        let dispatcher = Arc::new(TaskDispatcher::new(
            Arc::clone(&task_repository),
            Arc::clone(&api_keys) as Arc<dyn embedflow_domain::ports::providers::ApiKeyResolver>,
            Arc::clone(&agent_queue),
            Arc::clone(&event_bus),
        ));
        let scheduler = Arc::new(SchedulerTick::new(
            Arc::clone(&task_repository),
            dispatcher,
            Arc::clone(&event_bus),
            config.scheduler.default_timezone.clone(),
        ));
        let status_query: Arc<dyn StatusQueryInterface> = Arc::new(StatusQueryService::new(
            Arc::clone(&progress_store),
            Arc::clone(&object_store),
            Arc::new(HashKeyTranslator::new()),
            config.pipeline.image_bucket.clone(),
        ));
        let callback_sink = Arc::new(TaskCallbackSink::new(
            Arc::clone(&task_repository),
            Arc::clone(&mailer) as Arc<dyn embedflow_domain::ports::providers::MailerProvider>,
            Arc::clone(&event_bus),
        ));

        info!(
            vector_store = vector_store.provider_name(),
            consumers = config.pipeline.consumer_count,
            "Application context built"
        );

        Ok(Self {
            config,
            chunk_queue,
            agent_queue,
            object_store,
            progress_store,
            task_repository,
            vector_store,
            event_bus,
            coordinator,
            worker,
            scheduler,
            status_query,
            callback_sink,
            api_keys,
            mailer,
        })
    }
}

async fn build_vector_store(config: &AppConfig) -> Result<Arc<dyn VectorStoreGateway>> {
    match config.vector_store.provider.as_str() {
        "memory" => Ok(Arc::new(InMemoryVectorStore::new())),
        #[cfg(feature = "vectorstore-postgres")]
        "postgres" => {
            let url = config
                .vector_store
                .postgres_url
                .as_deref()
                .ok_or_else(|| Error::ConfigMissing("vector_store.postgres_url".to_owned()))?;
            let store = embedflow_providers::vector_store::PostgresVectorStore::connect(
                url,
                config.vector_store.max_connections,
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "vectorstore-postgres"))]
        "postgres" => Err(Error::config(
            "postgres backend requires the vectorstore-postgres feature",
        )),
        other => Err(Error::ConfigInvalid {
            key: "vector_store.provider".to_owned(),
            message: format!("unknown backend '{other}'"),
        }),
    }
}

fn build_embedding_provider(config: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding.provider.as_str() {
        "http" => {
            let endpoint = config
                .embedding
                .endpoint
                .as_deref()
                .ok_or_else(|| Error::ConfigMissing("embedding.endpoint".to_owned()))?;
            let mut http_config = HttpEmbeddingConfig::new(
                endpoint,
                config.embedding.model.clone(),
                config.embedding.dimensions,
            );
            http_config.timeout_secs = config.embedding.timeout_secs;
            http_config.api_key = resolve_env_key(config.embedding.api_key_env.as_deref());
            Ok(Arc::new(HttpEmbeddingProvider::new(http_config)?))
        }
        _ => Ok(Arc::new(HashEmbeddingProvider::new(
            config.embedding.dimensions,
        ))),
    }
}

fn build_qa_provider(config: &AppConfig) -> Result<Arc<dyn QaSummaryProvider>> {
    match config.qa.provider.as_str() {
        "http" => {
            let endpoint = config
                .qa
                .endpoint
                .as_deref()
                .ok_or_else(|| Error::ConfigMissing("qa.endpoint".to_owned()))?;
            let mut qa_config = QaEndpointConfig::new(endpoint, config.qa.model.clone());
            qa_config.timeout_secs = config.qa.timeout_secs;
            qa_config.api_key = resolve_env_key(config.qa.api_key_env.as_deref());
            Ok(Arc::new(HttpQaSummaryProvider::new(qa_config)?))
        }
        _ => Ok(Arc::new(LocalQaSummaryProvider::new())),
    }
}

fn resolve_env_key(name: Option<&str>) -> Option<String> {
    name.and_then(|name| std::env::var(name).ok())
}
