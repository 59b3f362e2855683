use anyhow::Context;
use assured::config::{LogFormat, ServerConfig};
use assured::logging::init_tracing;
use assured::StubServer;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Programmable HTTP stub server for integration tests
#[derive(Parser, Debug)]
#[command(name = "assured")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind (overrides the config file)
    #[arg(long, env = "ASSURED_HOST")]
    host: Option<String>,

    /// Port to bind, 0 for an OS-assigned port (overrides the config file)
    #[arg(short, long, env = "ASSURED_PORT")]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "ASSURED_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig, anyhow::Error> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Args::parse().into_config()?;
    init_tracing(&config.logging)?;

    let server = StubServer::bind(&config).await?;
    info!("Stubs are served under http://{}/when", server.local_addr());

    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
