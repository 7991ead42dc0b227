use crate::catalog::ResourceCatalog;
use crate::config::Config;
use crate::metrics::RequestMetrics;
use crate::push::trigger_push;
use anyhow::{Context, Result};
use axum::{http::StatusCode, middleware, response::IntoResponse, routing::get, Router};
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use pushcast_common::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod http2;
pub mod observer;
pub mod tls;

pub use observer::{observe_request, RequestObserver};

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Resources pushed on every trigger, in push order
    pub catalog: Arc<ResourceCatalog>,
    /// Request counter shared by the observer and the push trigger
    pub metrics: Arc<RequestMetrics>,
}

impl AppContext {
    pub fn new(config: Config, catalog: ResourceCatalog) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            metrics: Arc::new(RequestMetrics::new()),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let observer = RequestObserver::new(ctx.metrics.clone(), ctx.catalog.len());

    // Only static resources are observed; pushed segments come back through
    // here as synthetic requests and are counted against the catalog size.
    let static_routes = Router::new()
        .nest_service(
            ctx.catalog.mount_path(),
            ServeDir::new(&ctx.config.catalog.directory),
        )
        .layer(middleware::from_fn_with_state(observer, observe_request));

    Router::new()
        .route("/health", get(health_check))
        // Not observed: the trigger resets the counter and is not part of
        // its own tally. Only static and pushed segment requests count.
        .route("/push", get(trigger_push))
        .merge(static_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Build the catalog, bind both listeners and serve until shutdown.
///
/// The plaintext listener runs in the background; the TLS accept loop is the
/// foreground task. A bind failure on either listener, or a plaintext server
/// failure at runtime, ends the process with an error.
pub async fn start_server(config: Config) -> Result<()> {
    let host = config
        .server
        .host
        .clone()
        .ok_or_else(|| Error::startup_config("Please specify an address to listen on"))?;

    let catalog = ResourceCatalog::build(
        &config.catalog.directory,
        &config.catalog.mount,
        &config.catalog.suffix,
    )?;
    tracing::info!(
        "Catalog has {} resources under {}",
        catalog.len(),
        catalog.mount_path()
    );

    let acceptor = tls::load_acceptor(&config.tls.cert_path, &config.tls.key_path)?;

    let http_addr = resolve_addr(&host, config.server.http_port).await?;
    let https_addr = resolve_addr(&host, config.server.https_port).await?;
    let http_listener = bind(http_addr).await?;
    let https_listener = bind(https_addr).await?;

    let app = create_router(AppContext::new(config, catalog));
    let cancel = CancellationToken::new();

    tracing::info!("Listening on http://{} and https://{}", http_addr, https_addr);

    tokio::spawn(shutdown_signal(cancel.clone()));

    let plaintext = tokio::spawn(serve_plaintext(http_listener, app.clone(), cancel.clone()));

    serve_tls(https_listener, acceptor, app, cancel.clone()).await;

    cancel.cancel();
    plaintext
        .await
        .context("Plaintext listener task panicked")??;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let addr = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| Error::startup_config(format!("Invalid listen address {host:?}: {e}")))?
        .next()
        .ok_or_else(|| Error::startup_config(format!("No address found for {host:?}")))?;
    Ok(addr)
}

async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::listener_bind(addr, e))?;
    Ok(listener)
}

/// Serve HTTP/1.1 (and h2c with prior knowledge) without push support.
///
/// A serve failure cancels `cancel` so the TLS loop winds down too.
pub async fn serve_plaintext(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
) -> Result<()> {
    let shutdown = cancel.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    if let Err(e) = result {
        tracing::error!("Plaintext listener failed: {}", e);
        cancel.cancel();
        return Err(e).context("Plaintext listener failed");
    }
    Ok(())
}

/// Accept TLS connections until `cancel` fires.
///
/// Connections that negotiate `h2` are driven by [`http2::serve_connection`]
/// and can push; anything else is served as HTTP/1.1 through hyper.
pub async fn serve_tls(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    app: Router,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let acceptor = acceptor.clone();
                        let app = app.clone();
                        tokio::spawn(handle_tls_connection(stream, acceptor, app));
                    }
                    Err(e) => {
                        tracing::debug!("Accept error: {e}");
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}

async fn handle_tls_connection(stream: tokio::net::TcpStream, acceptor: TlsAcceptor, app: Router) {
    let stream = match acceptor.accept(stream).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!("TLS handshake failed: {e}");
            return;
        }
    };

    let negotiated_h2 = stream.get_ref().1.alpn_protocol() == Some(tls::ALPN_H2);
    if negotiated_h2 {
        if let Err(e) = http2::serve_connection(stream, app).await {
            tracing::debug!("HTTP/2 connection error: {e}");
        }
        return;
    }

    let io = TokioIo::new(stream);
    let hyper_service = TowerToHyperService::new(app.into_service());
    if let Err(e) = hyper::server::conn::http1::Builder::new()
        .serve_connection(io, hyper_service)
        .await
    {
        tracing::debug!("Hyper connection error: {e}");
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = cancel.cancelled() => return,
    }

    tracing::info!("Shutdown signal received");
    cancel.cancel();
}
