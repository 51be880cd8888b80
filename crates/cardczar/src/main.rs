use cardczar::{CardczarError, CardczarServerBuilder, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), CardczarError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = CardczarServerBuilder::from_config(ServerConfig::from_env())
        .build()
        .await?;
    let directory = server.directory();

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            directory.shutdown().await;
            Ok(())
        }
    }
}
