use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    novelsite::logging::init().context("init logging")?;

    let cli = novelsite::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        novelsite::cli::Command::Crawl(args) => {
            tokio::task::block_in_place(|| novelsite::crawl::run(args)).context("crawl")?;
        }
        novelsite::cli::Command::Build(args) => {
            novelsite::site::run(args).context("build")?;
        }
        novelsite::cli::Command::Serve(args) => {
            novelsite::serve::run(args).await.context("serve")?;
        }
    }

    Ok(())
}
