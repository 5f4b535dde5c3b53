mod app;
mod cli;
mod persistence;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    scrape_logging::initialize(cli.log_destination(), cli.log_level);
    app::run(cli).await
}
