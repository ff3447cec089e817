use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plan_mcp::config::Config;
use plan_mcp::{api, mcp};

#[derive(Parser)]
#[command(name = "plan-mcp")]
#[command(about = "MCP server for project planning, code review and execution analysis with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server via stdio (default)
    Mcp,
    /// Serve MCP over streamable HTTP at /mcp
    Serve {
        /// Port for the HTTP transport
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Validate configuration and print the effective settings
    Check,
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout.
/// `RUST_LOG` wins over the directive derived from `LOG_LEVEL`.
fn init_tracing(use_stderr: bool, default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| format!("{},tower_http=info", default_directive)),
    );

    if use_stderr {
        // stdout is the protocol channel
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Mcp);

    let config = Config::from_env();
    let directive = config
        .as_ref()
        .map(Config::log_directive)
        .unwrap_or_else(|_| "plan_mcp=info".to_string());
    init_tracing(!matches!(command, Commands::Serve { .. }), &directive);

    let config = match config {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    match command {
        Commands::Mcp => mcp::run_stdio_server(config).await?,
        Commands::Serve { port } => {
            tracing::info!("Starting plan-mcp HTTP transport on port {}", port);
            api::serve(config, port).await?;
        }
        Commands::Check => {
            println!("Configuration OK");
            println!("  model:       {}", config.model);
            println!("  endpoint:    {}", config.base_url);
            println!("  timeout:     {}s", config.timeout.as_secs());
            println!("  max retries: {}", config.retry.max_retries);
            println!(
                "  http auth:   {}",
                if config.http_api_key.is_some() { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}
