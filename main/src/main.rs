use std::sync::Arc;

use axum::Router;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use alert_pipeline::{AlertParserRegistry, AlertPipeline};
use api_router::{api_routes_v1, api_state::ApiState, health_routes};
use checklist_generation::ChecklistGenerator;
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::store::StorageManager;
use common::storage::vector::{LocalVectorStore, SurrealVectorStore, VectorStore};
use common::utils::config::{
    get_config, AppConfig, CloudProvider, EmbeddingBackend, VectorStoreProvider,
};
use common::utils::embedding::{Embedder, HashedEmbedder, OpenAiEmbedder};
use common::utils::llm::OpenAiTextModel;
use enrichment_pipeline::providers::{
    LocalLogsProvider, LocalMetadataProvider, LocalMetricsProvider,
};
use enrichment_pipeline::Enricher;
use ingestion_pipeline::IngestionPipeline;
use retrieval_pipeline::Retriever;
use webhook_dispatch::{Destination, Dispatcher, FileDestination, WebhookDestination};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;
    let http_port = config.http_port;

    let (app, tracker) = build_application(config).await?;

    let serve_address = format!("0.0.0.0:{http_port}");
    info!("Starting server listening on {serve_address}");
    let listener = tokio::net::TcpListener::bind(serve_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received; draining background work");
        })
        .await?;

    // Let pending dispatch fan-outs and runbook syncs finish before exit.
    tracker.close();
    tracker.wait().await;
    info!("Background work drained; exiting");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
    }
}

/// Construct every component from configuration and assemble the router.
async fn build_application(config: AppConfig) -> Result<(Router, TaskTracker), AppError> {
    let storage = StorageManager::new(&config).await?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.llm.api_key)
            .with_api_base(&config.llm.base_url),
    ));

    let embedder: Arc<dyn Embedder> = match config.llm.embedding_backend {
        EmbeddingBackend::Api => Arc::new(OpenAiEmbedder::new(
            openai_client.clone(),
            config.llm.embedding_model.clone(),
            config.llm.embedding_dimensions,
        )),
        EmbeddingBackend::Hashed => Arc::new(HashedEmbedder::new(
            config.llm.embedding_dimensions as usize,
        )?),
    };
    info!(
        backend = embedder.backend_label(),
        dimension = embedder.dimension(),
        "Embedding provider initialized"
    );

    let vector_store: Arc<dyn VectorStore> = match config.vector_store.provider {
        VectorStoreProvider::Local => Arc::new(LocalVectorStore::new()),
        VectorStoreProvider::Surreal => {
            let db = Arc::new(
                SurrealDbClient::new(
                    &config.vector_store.address,
                    &config.vector_store.username,
                    &config.vector_store.password,
                    &config.vector_store.namespace,
                    &config.vector_store.database,
                )
                .await?,
            );
            Arc::new(SurrealVectorStore::new(db, embedder.dimension()).await?)
        }
    };
    info!(provider = vector_store.provider_type(), "Vector store ready");

    // Cloud SDK-backed providers plug in behind the same traits; only the
    // bucket-backed local mode ships here.
    let enricher = match config.cloud.provider {
        CloudProvider::Local => Enricher::new(
            Arc::new(LocalMetadataProvider::new(storage.clone())),
            Arc::new(LocalMetricsProvider::new(storage.clone())),
            Arc::new(LocalLogsProvider::new(storage.clone())),
        )
        .with_lookback_minutes(config.enrichment.lookback_minutes as i64),
        CloudProvider::Aws | CloudProvider::Oci => {
            return Err(AppError::Config(
                "The aws/oci enrichment providers are not bundled with this build; \
                 set cloud.provider = \"local\""
                    .to_string(),
            ));
        }
    };

    let retriever = Retriever::new(embedder.clone(), Arc::clone(&vector_store));
    let generator = ChecklistGenerator::new(Arc::new(OpenAiTextModel::new(
        openai_client,
        config.llm.text_model.clone(),
        config.llm.provider_label(),
    )));
    let pipeline = Arc::new(AlertPipeline::new(enricher, retriever, generator));

    let ingestion = Arc::new(IngestionPipeline::new(
        storage,
        embedder,
        vector_store,
        &config.runbooks,
    )?);

    let mut destinations: Vec<Arc<dyn Destination>> = Vec::new();
    if config.output.file.enabled {
        destinations.push(Arc::new(FileDestination::new(
            config.output.file.output_directory.clone(),
            true,
        )));
    }
    for webhook in &config.output.webhooks {
        if !webhook.enabled {
            warn!(name = %webhook.name, "Skipping disabled webhook destination");
            continue;
        }
        destinations.push(Arc::new(WebhookDestination::new(webhook.clone())?));
    }
    info!(destinations = destinations.len(), "Dispatcher configured");
    let dispatcher = Arc::new(Dispatcher::new(destinations));

    let state = ApiState::new(
        Arc::new(AlertParserRegistry::with_defaults()),
        pipeline,
        dispatcher,
        ingestion.clone(),
        config.clone(),
    );

    if config.runbooks.ingest_on_startup {
        let startup_ingestion = ingestion;
        state.tracker.spawn(async move {
            match startup_ingestion.ingest_all().await {
                Ok(report) => info!(
                    ingested = report.ingested,
                    failed = report.failed,
                    chunks = report.chunks,
                    "Startup runbook ingestion finished"
                ),
                Err(err) => error!(error = %err, "Startup runbook ingestion failed"),
            }
        });
    }

    let tracker = state.tracker.clone();
    let app = Router::new()
        .nest("/api/v1", api_routes_v1(state))
        .merge(health_routes());

    Ok((app, tracker))
}
