use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, bail};
use dotenvy::dotenv;
use sales_api::db::init_db_pool;
use sales_api::handlers::api;
use sales_api::logging::{init_tracing, install_panic_hook, shutdown_tracer};
use sales_api::metrics::{Metrics, debug_router, init_prometheus};
use sales_api::state::AppState;
use sales_auth::{
    Algorithm, Auth, KeyStore, private_key_from_pem, public_key_from_pem, single_key_lookup,
};
use sales_config::{BUILD, Config};
use sales_web::ShutdownSignal;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::from_env();

    if let Err(e) = init_tracing(&config.observability) {
        eprintln!("❌ Failed to initialize tracing: {:#}", e);
    }
    install_panic_hook();

    let result = run(config).await;
    shutdown_tracer();

    if let Err(e) = result {
        error!(error = %format!("{:#}", e), "startup");
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!(build = BUILD, "starting service");
    info!("startup config:\n{}", config);

    // =========================================================================
    // Authentication support

    info!(kid = %config.auth.key_id, "initializing authentication support");

    let algorithm = Algorithm::from_str(&config.auth.algorithm)
        .with_context(|| format!("unsupported algorithm {}", config.auth.algorithm))?;

    let private_pem = tokio::fs::read(&config.auth.private_key_file)
        .await
        .with_context(|| format!("reading private key {}", config.auth.private_key_file))?;
    let private_key = private_key_from_pem(&private_pem).context("parsing private key")?;

    let public_pem = tokio::fs::read(&config.auth.public_key_file)
        .await
        .with_context(|| format!("reading public key {}", config.auth.public_key_file))?;
    let public_key = public_key_from_pem(&public_pem).context("parsing public key")?;

    let keys: KeyStore = [(config.auth.key_id.clone(), private_key)]
        .into_iter()
        .collect();
    let auth = Auth::new(
        algorithm,
        single_key_lookup(config.auth.key_id.clone(), public_key),
        keys,
    )
    .with_leeway(config.auth.leeway);

    // =========================================================================
    // Database support

    info!(host = %config.db.host, "initializing database support");
    let db = init_db_pool(&config.db)?;

    // =========================================================================
    // Debug service

    let metrics = Arc::new(Metrics::new());
    let prometheus = init_prometheus(config.observability.enabled)?;

    let debug_listener = TcpListener::bind(&config.web.debug_host)
        .await
        .with_context(|| format!("binding debug listener {}", config.web.debug_host))?;
    let debug_app = debug_router(BUILD, metrics.clone(), prometheus);
    info!(host = %config.web.debug_host, "debug router started");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(debug_listener, debug_app).await {
            error!(error = %e, "debug router closed");
        }
    });

    // =========================================================================
    // API service

    let (shutdown, mut shutdown_requested) = ShutdownSignal::new();

    let state = AppState {
        build: BUILD.to_string(),
        auth: Arc::new(auth),
        db: Arc::new(db),
        metrics,
    };
    let router = api(shutdown.clone(), state).into_router();

    let api_listener = TcpListener::bind(&config.web.api_host)
        .await
        .with_context(|| format!("binding api listener {}", config.web.api_host))?;
    info!(host = %config.web.api_host, "api router started");

    let mut draining = shutdown.subscribe();
    let mut server = tokio::spawn(async move {
        axum::serve(
            api_listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { draining.wait().await })
        .await
    });

    // =========================================================================
    // Shutdown

    tokio::select! {
        result = &mut server => {
            result.context("api server task")?.context("api server error")?;
            bail!("api server stopped unexpectedly");
        }
        () = os_signal() => info!("shutdown started: signal received"),
        () = shutdown_requested.wait() => info!("shutdown started: requested by the pipeline"),
    }

    shutdown.signal();

    match tokio::time::timeout(config.web.shutdown_timeout, &mut server).await {
        Ok(result) => {
            result.context("api server task")?.context("api server error")?;
        }
        Err(_) => {
            server.abort();
            bail!(
                "could not stop server gracefully within {}s",
                config.web.shutdown_timeout.as_secs()
            );
        }
    }

    info!("shutdown complete");
    Ok(())
}

async fn os_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
