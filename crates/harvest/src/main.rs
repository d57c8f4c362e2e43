use anyhow::Context as _;
use clap::Parser;
use tracing::info;
use unrelated_api_tools::runtime::{RuntimeArgs, init_tracing};
use unrelated_api_tools::{McpServer, serve_stdio};
use unrelated_harvest_mcp::{HarvestConfig, build_dispatcher, identity};

/// MCP server for the Harvest time-tracking API (stdio transport).
#[derive(Debug, Parser)]
#[command(name = "unrelated-harvest-mcp", version, about)]
struct Cli {
    #[command(flatten)]
    harvest: HarvestConfig,

    #[command(flatten)]
    runtime: RuntimeArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.runtime)?;

    let dispatcher = build_dispatcher(&cli.harvest, &cli.runtime).context("startup failed")?;
    info!(
        tools = dispatcher.registry().len(),
        base_url = %cli.harvest.base_url,
        "Harvest MCP server ready on stdio"
    );

    let server = McpServer::new(dispatcher, identity());
    serve_stdio(&server).await?;
    Ok(())
}
