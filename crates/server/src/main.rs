use clap::Parser;
use geofleet::{Config, DriverManager};
use geofleet_server::run_server;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geofleet_server=info,geofleet=info,info".into()),
        )
        .init();

    let args = Args::parse();

    let config = Config::from_env();
    info!(
        use_redis = config.use_redis,
        redis_addr = %config.redis_addr,
        "starting driver registry"
    );

    let manager = DriverManager::new(config).await?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl_c signal");
    };

    run_server(addr, Arc::new(manager), shutdown).await?;

    Ok(())
}
