use clap::Parser;
use proxysplit::cli::Cli;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Missing or malformed flags exit here with a usage error.
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> proxysplit::Result<()> {
    let download = cli.download()?;
    let pool = cli.pool()?;
    let report = cli.downloader().download(&pool, &download).await?;
    info!(
        "Saved {} bytes to {:?} ({} chunks fetched, {} resumed)",
        report.total_size(),
        report.output(),
        report.fetched(),
        report.skipped()
    );
    Ok(())
}
