//! Lead service entry point.
//!
//! # Purpose
//! Wires configuration, the primary store, sinks, and conversion clients
//! into the dispatcher, then starts the HTTP server and metrics endpoint.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup
//! logic.
use anyhow::Context;
use leads::app::{build_router, AppState};
use leads::config::{LeadsConfig, StorageBackend};
use leads::contacts::RelationalDirectory;
use leads::conversions::ads::AdsClient;
use leads::conversions::ga4::Ga4Client;
use leads::dispatch::Dispatcher;
use leads::notify::EmailWorkerNotifier;
use leads::observability;
use leads::sinks::docstore::DocstoreSink;
use leads::store::memory::InMemoryStore;
use leads::store::warehouse::WarehouseStore;
use leads::store::LeadStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// One bounded-timeout client shared by every outbound integration.
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LeadsConfig::from_env_or_yaml()?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: LeadsConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("brigade-leads");
    let state = build_state(&config)?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, "leads service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

fn build_state(config: &LeadsConfig) -> anyhow::Result<AppState> {
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .with_context(|| "build http client")?;

    let store: Arc<dyn LeadStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Warehouse => {
            let warehouse = config
                .warehouse
                .as_ref()
                .context("warehouse configuration missing")?;
            Arc::new(WarehouseStore::new(client.clone(), warehouse)?)
        }
    };
    tracing::info!(backend = store.backend_name(), "lead store ready");

    let mut dispatcher = Dispatcher::new(store);
    if let Some(docstore) = &config.docstore {
        dispatcher = dispatcher.with_sink(Arc::new(DocstoreSink::new(client.clone(), docstore)?));
    }
    if let Some(relational) = &config.relational {
        dispatcher =
            dispatcher.with_contacts(Arc::new(RelationalDirectory::new(client.clone(), relational)));
    }
    if let Some(url) = &config.email_worker_url {
        dispatcher =
            dispatcher.with_notifier(Arc::new(EmailWorkerNotifier::new(client.clone(), url.clone())));
    }
    if let Some(ga4) = &config.ga4 {
        dispatcher = dispatcher.with_analytics(Arc::new(Ga4Client::new(client.clone(), ga4)));
    }
    if let Some(ads) = &config.ads {
        dispatcher = dispatcher.with_ads(Arc::new(AdsClient::new(client, ads.clone())));
    }

    Ok(AppState {
        dispatcher: Arc::new(dispatcher),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn memory_config() -> LeadsConfig {
        LeadsConfig {
            bind_addr: "127.0.0.1:0".parse().expect("bind"),
            metrics_bind: "127.0.0.1:0".parse().expect("metrics"),
            storage: StorageBackend::Memory,
            warehouse: None,
            docstore: None,
            relational: None,
            email_worker_url: None,
            ga4: None,
            ads: None,
        }
    }

    #[tokio::test]
    async fn build_state_memory_backend() {
        let state = build_state(&memory_config()).expect("state");
        assert_eq!(state.dispatcher.store().backend_name(), "memory");
        assert!(!state.dispatcher.store().is_durable());
    }

    #[tokio::test]
    async fn build_state_warehouse_requires_config() {
        let config = LeadsConfig {
            storage: StorageBackend::Warehouse,
            ..memory_config()
        };
        let err = build_state(&config).err().expect("missing warehouse");
        assert!(err.to_string().contains("warehouse configuration missing"));
    }

    #[tokio::test]
    #[serial]
    async fn run_with_shutdown_starts_and_stops() {
        run_with_shutdown(memory_config(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
        })
        .await
        .expect("run should stop cleanly");
    }
}
