use clap::Parser;
use relay_server::{config::AppConfig, error, server, utils};

#[derive(Parser, Debug)]
#[command(name = "relay_server", about = "WebRTC screen relay: SDP signaling plus RTP/H264 UDP ingest")]
struct Args {
    /// TOML config file layered over the built-in defaults
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref())?;
    utils::log::init(&config.log);

    if let Err(e) = server::run(config).await {
        error!("relay server exited: {:#}", e);
        return Err(e);
    }
    Ok(())
}
