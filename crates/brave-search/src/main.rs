use anyhow::Context as _;
use clap::Parser;
use tracing::{info, warn};
use unrelated_api_tools::runtime::{RuntimeArgs, init_tracing};
use unrelated_api_tools::{McpServer, serve_stdio};
use unrelated_brave_search_mcp::{BraveConfig, build_dispatcher, identity};

/// MCP server for Brave web search and page fetching (stdio transport).
#[derive(Debug, Parser)]
#[command(name = "unrelated-brave-search-mcp", version, about)]
struct Cli {
    #[command(flatten)]
    brave: BraveConfig,

    #[command(flatten)]
    runtime: RuntimeArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.runtime)?;

    let dispatcher = build_dispatcher(&cli.brave, &cli.runtime).context("startup failed")?;
    if cli.brave.allow_private_fetch {
        warn!("fetch_website may reach private and loopback addresses");
    }
    info!(
        tools = dispatcher.registry().len(),
        base_url = %cli.brave.base_url,
        "Brave Search MCP server ready on stdio"
    );

    let server = McpServer::new(dispatcher, identity());
    serve_stdio(&server).await?;
    Ok(())
}
