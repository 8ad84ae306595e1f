use mcp_echo_server::{
    config::Config, domain::tools::tool_catalog, errors::AppError, logging,
    registry::ConnectionRegistry, serve, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env().map_err(AppError::Config)?;
    logging::init_logging(config.log_format);

    let bind_socket = config.bind_socket().map_err(AppError::Config)?;
    let listener = tokio::net::TcpListener::bind(bind_socket)
        .await
        .map_err(|source| AppError::Bind {
            addr: bind_socket,
            source,
        })?;

    info!(
        address = %bind_socket,
        static_dir = %config.static_dir.display(),
        tools = tool_catalog().len(),
        "starting MCP server"
    );

    let state = AppState::new(ConnectionRegistry::new());
    serve(
        listener,
        state,
        &config.static_dir,
        shutdown_signal(),
        config.shutdown_grace,
    )
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, shutting down server");
}
