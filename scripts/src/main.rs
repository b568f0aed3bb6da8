use clap::Parser;
use deploy_scripts::cli::Cli;
use eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    cli.run().await?;
    Ok(())
}
