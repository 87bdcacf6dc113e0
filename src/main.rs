use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskmaster::config::ClientConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "taskmaster")]
#[command(version, about = "Interactive terminal client for the TaskMaster backend")]
pub struct Cli {
    /// Backend base URL. Overrides TASKMASTER_API_URL.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Log client-side request/response detail to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "taskmaster=debug"
    } else {
        "taskmaster=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url);
    }

    cmd::run(&config).await
}
