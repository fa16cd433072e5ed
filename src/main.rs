use anyhow::Result;
use clap::Parser;
use logistics_tracker::{
    cli::{self, Cli},
    config::Config,
    context::AppContext,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = AppContext::new(config)?;
    ctx.validation.log();

    cli::run(ctx, args.command).await
}
