use tokio::io::BufReader;

use smartta_client::cli;
use smartta_client::config::ClientConfig;
use smartta_client::surface::TerminalSurface;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the chat display.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::from_env()?;
    if config.session_id.is_none() {
        config.session_id = Some(uuid::Uuid::new_v4().to_string());
    }

    eprintln!("🎓 SmartTA client v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.backend_url);
    eprintln!(
        "   Timeouts: connect {:?}, read {:?}, write {:?}",
        config.connect_timeout, config.read_timeout, config.write_timeout
    );
    eprintln!("   Type a question and press Enter. /help for commands, /quit to exit.\n");

    cli::serve(
        config,
        TerminalSurface::stdout(),
        BufReader::new(tokio::io::stdin()),
    )
    .await?;

    Ok(())
}
