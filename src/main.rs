use clap::Parser;
use sentinelhub_mcp::app::App;
use sentinelhub_mcp::errors::ToolError;
use sentinelhub_mcp::mcp::server::McpServer;
use sentinelhub_mcp::services::config::SentinelConfig;
use sentinelhub_mcp::services::logger::Logger;
use sentinelhub_mcp::web;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sentinelhub-mcp", version, about = "MCP server for the Sentinel Hub statistical and processing APIs")]
struct Cli {
    /// Serve /health and /tools on this address (defaults to 0.0.0.0:$PORT when PORT is set).
    #[arg(long, value_name = "ADDR")]
    http: Option<SocketAddr>,
    /// Run only the web surface, without the stdio MCP transport.
    #[arg(long)]
    http_only: bool,
}

fn web_address(cli: &Cli) -> Result<Option<SocketAddr>, ToolError> {
    if let Some(addr) = cli.http {
        return Ok(Some(addr));
    }
    let Ok(raw) = std::env::var("PORT") else {
        return Ok(None);
    };
    let port = raw.trim().parse::<u16>().map_err(|_| {
        ToolError::validation("invalid_configuration", format!("PORT is not a valid port: {}", raw))
    })?;
    Ok(Some(SocketAddr::from(([0, 0, 0, 0], port))))
}

async fn run(cli: Cli) -> Result<(), ToolError> {
    let logger = Logger::new("sentinelhub");
    let config = SentinelConfig::from_env()
        .map_err(|err| ToolError::validation("invalid_configuration", err.to_string()))?;
    let app = Arc::new(App::initialize(config, logger)?);
    let web_addr = web_address(&cli)?;

    if cli.http_only {
        let addr = web_addr.ok_or_else(|| {
            ToolError::validation(
                "invalid_configuration",
                "--http-only needs --http <ADDR> or PORT",
            )
        })?;
        return web::serve(addr, app).await;
    }

    let web_task = web_addr.map(|addr| {
        let app = app.clone();
        tokio::spawn(async move {
            if let Err(err) = web::serve(addr, app.clone()).await {
                app.logger.error(
                    "web surface stopped",
                    Some(&serde_json::json!({ "error": err.message })),
                );
            }
        })
    });

    let result = McpServer::new(app).run_stdio().await;
    if let Some(task) = web_task {
        task.abort();
    }
    result
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("sentinelhub-mcp: {}", err);
        std::process::exit(1);
    }
}
