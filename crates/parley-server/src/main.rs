use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use parley_server::{HubServer, ServerConfig};

#[derive(Parser)]
#[command(name = "parley-server", about = "Group chat hub with coordinator election")]
struct Cli {
    /// TOML config file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on [default: 0.0.0.0:1108].
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Seconds between liveness sweeps [default: 20].
    #[arg(long)]
    sweep_interval: Option<u64>,

    /// Longest accepted request line in bytes [default: 8192].
    #[arg(long)]
    max_line_length: Option<usize>,

    /// Lines queued per client before it counts as dead [default: 1024].
    #[arg(long)]
    outbound_buffer: Option<usize>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(secs) = self.sweep_interval {
            config.sweep_interval_secs = secs;
        }
        if let Some(max) = self.max_line_length {
            config.max_line_length = max;
        }
        if let Some(buffer) = self.outbound_buffer {
            config.outbound_buffer = buffer;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config()?;
    let server = HubServer::bind(config.clone()).await?;

    eprintln!("parley-server v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Listening on {}", server.local_addr()?);
    eprintln!("Sweep interval: {}s", config.sweep_interval_secs);
    eprintln!();

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
