use std::sync::Arc;
use tokio::signal;
use tollgate::api;
use tollgate::logger::*;
use tollgate::server::*;
use tollgate::settings::*;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;

    let server = Arc::new(Server::try_new(&project_settings).await?);

    let api_v1 = warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(server.clone()))
        .recover(api::v1::recover_error);

    match &project_settings.http.tls {
        Some(tls) => {
            if !std::fs::metadata(&tls.cert_path)?.is_file() {
                return Err(anyhow::anyhow!(
                    "TLS cert is not a regular file: {:?}",
                    tls.cert_path
                ));
            }
            if !std::fs::metadata(&tls.key_path)?.is_file() {
                return Err(anyhow::anyhow!(
                    "TLS key is not a regular file: {:?}",
                    tls.key_path
                ));
            }
            warp::serve(api_v1)
                .tls()
                .cert_path(&tls.cert_path)
                .key_path(&tls.key_path)
                .bind_with_graceful_shutdown(address, shutdown_signal())
                .1
                .await;
        }
        None => {
            warp::serve(api_v1)
                .bind_with_graceful_shutdown(address, shutdown_signal())
                .1
                .await;
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(30);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => tracing::info!("server shutdown complete"),
        Err(_) => tracing::error!("server shutdown timed out"),
    }

    Ok(())
}

async fn shutdown_signal() {
    signal::ctrl_c().await.expect("Could not register SIGINT");
}
