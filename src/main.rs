use anyhow::Result;
use clap::Parser;

use webpages_editor::cli;
use webpages_editor::config::{Args, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(&args)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    cli::run(args.command, config).await
}
