use callrelay_core::RelayConfig;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use callrelay_server::http;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "callrelay.toml")]
    config: String,

    /// Print which integrations are configured, then exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience; production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match RelayConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    if args.check_config {
        let mark = |ok: bool| if ok { "✅" } else { "❌" };
        let board_ids = config.board.board_ids();
        println!(
            "{} CRM: {}",
            mark(config.crm.credentials().is_some()),
            config.crm.base_url
        );
        println!(
            "{} Boards: {} ({} board id(s))",
            mark(config.board.api_key().is_some() && !board_ids.is_empty()),
            config.board.base_url,
            board_ids.len()
        );
        println!("   Listen: {}:{}", config.http.host, config.http.port);
        println!("   Dashboard files: {}", config.http.public_dir);
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(config, tx.subscribe()).await?;

    Ok(())
}
