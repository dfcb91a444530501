use clap::Parser;
use heimdall::db;
use heimdall::server::config::ServerConfig;
use heimdall::server::logging::init_logging;
use heimdall::version::VERSION;
use heimdall::web::create_axum_router;
use std::net::SocketAddr;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Plain version output without going through clap.
    if std::env::args().any(|arg| arg == "--version") {
        println!("Server version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    // --- Server Config Setup ---
    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not set up yet, the log directory comes from the config.
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    let _log_guard = init_logging(&server_config.log_dir);
    info!("Starting server, version: {}", VERSION);

    // --- Database Pool Setup ---
    let db_pool = match db::connect(&server_config.database_url, server_config.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to create database connection.");
            return Err(e.into());
        }
    };

    if server_config.sync_schema {
        db::schema::create_tables(&db_pool).await?;
        info!("Database schema is up to date.");
    }

    let app = create_axum_router(db_pool);

    let addr: SocketAddr = server_config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal.");
            }
            info!("Shutdown signal received.");
        })
        .await
        .map_err(Box::new)?;

    Ok(())
}
