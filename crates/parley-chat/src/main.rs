mod console;

use clap::Parser;
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "parley-chat", about = "Console client for a Parley chat hub")]
struct Cli {
    /// Server address (host:port).
    #[arg(short, long, default_value = "127.0.0.1:1108")]
    server: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stream = TcpStream::connect(&cli.server).await?;
    tracing::debug!(server = %cli.server, "connected");

    console::run(stream).await
}
