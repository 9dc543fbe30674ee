use clap::Parser;
use puente_config::PuenteConfig;
use puente_core::master::Master;
use utils::init_tracing;

/// HTTP/1.0 forwarding proxy.
#[derive(Parser, Debug)]
#[command(name = "puente", version, about)]
struct Cli {
    /// Port to listen on for incoming client connections.
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = PuenteConfig::default();

    let master = Master::new(format!("0.0.0.0:{}", cli.port), cfg);
    master.run().await?;

    Ok(())
}
