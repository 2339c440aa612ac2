//! Entry point for the CTC Engine binary.
//!
//! Running this binary will start an HTTP server that exposes the salary
//! calculation API.  Company catalogs are loaded from the directory named
//! by `CTC_DATA_DIR`; see [`ctc_engine::config`] for all settings.

use ctc_engine::config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {err:#}");
            std::process::exit(2);
        }
    };
    tracing::info!(data_dir = ?config.data_dir, "starting ctc engine");
    if let Err(err) = ctc_engine::api::serve(config.bind_addr, config.data_dir).await {
        tracing::error!("error running server: {err:#}");
        std::process::exit(1);
    }
}
