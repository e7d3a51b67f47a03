//! Wiring from configuration to a running transport.

use std::future::Future;
use std::sync::Arc;

use chembl_client::chembl::{ChemblClient, ChemblConfig};
use chembl_client::traits::{ChemUtilities, DataService};
use chembl_config::{ServerConfig, TransportKind};
use chembl_tools::{DeadlinePolicy, ToolDispatcher};
use tracing::info;

use crate::catalog::build_registry;
use crate::error::ServerResult;
use crate::protocol::{RpcService, SharedService};
use crate::scheduler::RequestScheduler;
use crate::{http, stdio};

/// Builds the RPC service over explicit collaborators.
///
/// # Errors
///
/// Returns [`crate::ServerError`] if the deadlines are unusable or the
/// catalog fails to register.
pub fn build_service(
    config: &ServerConfig,
    data: Arc<dyn DataService>,
    utilities: Arc<dyn ChemUtilities>,
) -> ServerResult<SharedService> {
    let deadlines = DeadlinePolicy::from_secs_f64(
        config.deadlines.data_query_secs,
        config.deadlines.utility_secs,
    )?;
    let registry = build_registry(data, utilities, deadlines)?;
    info!(operations = registry.len(), "operation registry ready");
    Ok(Arc::new(RpcService::new(ToolDispatcher::new(Arc::new(registry)))))
}

/// Builds the RPC service backed by the ChEMBL web services.
///
/// # Errors
///
/// Returns [`crate::ServerError`] if the configuration is invalid.
pub fn build_default_service(config: &ServerConfig) -> ServerResult<SharedService> {
    config.validate()?;
    let client_config = ChemblConfig::new()
        .with_base_url(&config.upstream.base_url)?
        .with_timeout(config.upstream.request_timeout()?)
        .with_page_limit(config.upstream.page_limit);
    let client = Arc::new(ChemblClient::new(client_config));
    info!(base_url = client.config().base_url(), "upstream client ready");
    build_service(config, Arc::clone(&client) as Arc<dyn DataService>, client)
}

/// Serves `service` on the configured transport until it finishes or
/// `shutdown` resolves.
///
/// # Errors
///
/// Returns [`crate::ServerError`] if the transport fails to start or stops
/// with an error.
pub async fn serve<S>(
    config: &ServerConfig,
    service: SharedService,
    shutdown: S,
) -> ServerResult<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let scheduler = RequestScheduler::with_limit(config.max_in_flight);
    match config.transport {
        TransportKind::Stdio => {
            let serving = stdio::serve(service, scheduler, tokio::io::stdin(), tokio::io::stdout());
            tokio::select! {
                result = serving => result,
                () = shutdown => {
                    info!("shutdown requested");
                    Ok(())
                }
            }
        }
        TransportKind::Http => {
            let listener = http::bind(&config.bind_address())?;
            http::serve(service, scheduler, listener, shutdown).await
        }
    }
}
