use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use bkash_gateway::auth::TokenManager;
use bkash_gateway::config::{Config, LogFormat};
use bkash_gateway::routes;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = Config::load()?;

    init_tracing(&config);

    tracing::info!("🚀 bKash Gateway starting...");
    tracing::info!(
        "Server configured: {}:{}",
        config.server_host,
        config.server_port
    );

    config.gateway.validate()?;

    // Initialize token manager
    let gateway = Arc::new(config.gateway.clone());
    let token_manager = Arc::new(TokenManager::new(gateway)?);
    let shutdown = CancellationToken::new();

    // Warm the token cache; the server still starts if the gateway is down
    match token_manager.get_valid_token(&shutdown).await {
        Ok(token) => {
            tracing::info!(
                "✅ Authentication successful (token: {}...)",
                token.chars().take(12).collect::<String>()
            );
        }
        Err(e) => {
            tracing::error!("❌ Authentication failed: {}", e);
            tracing::warn!("Server will start but payment calls will fail until bKash accepts the credentials");
        }
    }

    let app_state = routes::AppState {
        token_manager,
        webhook_tolerance_secs: config.webhook_tolerance_secs,
        shutdown: shutdown.clone(),
    };

    let app = routes::build_app(app_state);

    // Bind to configured host and port
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    print_startup_banner(&config);

    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("👋 Server shutdown complete");

    Ok(())
}

/// Initialize logging with the configured level and format
fn init_tracing(config: &Config) {
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Print startup banner
fn print_startup_banner(config: &Config) {
    let banner = r#"
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║                  🚀 bKash Gateway                         ║
║                                                           ║
║     Tokenized checkout client with webhook receiver      ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner);
    println!("  Version:     {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Server:      http://{}:{}",
        config.server_host, config.server_port
    );
    println!("  Environment: {:?}", config.gateway.environment);
    println!("  bKash API:   {}", config.gateway.base_url());
    println!("  Log Level:   {}", config.log_level);
    println!();
}

/// Wait for Ctrl+C or SIGTERM, then cancel in-flight token work
async fn shutdown_signal(shutdown: CancellationToken) {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown...");
        },
    }

    shutdown.cancel();
}
