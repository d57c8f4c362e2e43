use anyhow::Context as _;
use clap::Parser;
use tracing::info;
use unrelated_api_tools::runtime::{RuntimeArgs, init_tracing};
use unrelated_api_tools::{McpServer, serve_stdio};
use unrelated_slack_mcp::{SlackConfig, build_dispatcher, identity, verify_auth};

/// MCP server for the Slack Web API (stdio transport).
#[derive(Debug, Parser)]
#[command(name = "unrelated-slack-mcp", version, about)]
struct Cli {
    #[command(flatten)]
    slack: SlackConfig,

    #[command(flatten)]
    runtime: RuntimeArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.runtime)?;

    let dispatcher = build_dispatcher(&cli.slack, &cli.runtime).context("startup failed")?;
    if cli.slack.skip_auth_check {
        info!("skipping Slack auth.test");
    } else {
        verify_auth(dispatcher.upstream(), &cli.slack.team_id)
            .await
            .context("startup failed")?;
    }
    info!(
        tools = dispatcher.registry().len(),
        team_id = %cli.slack.team_id,
        "Slack MCP server ready on stdio"
    );

    let server = McpServer::new(dispatcher, identity());
    serve_stdio(&server).await?;
    Ok(())
}
