use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rag_gateway::config::{find_config_file, get_config, load_config, save_config, Config};
use rag_gateway::gateway::{serve, Gateway};
use rag_gateway::mcp::McpServer;
use rag_gateway::rag::RagInvoker;
use rag_gateway::utils::validate_timeout;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RAG Gateway - expose an Agentic RAG engine as MCP tools and a streaming HTTP API
#[derive(Parser, Debug)]
#[command(name = "rag-gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Expose an Agentic RAG engine as MCP tools and a streaming HTTP API", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the RAG engine
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Address to bind, overriding the configured one
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Run the MCP tool server (stdio unless --http is given)
    Mcp {
        /// Serve streamable HTTP on this address instead of stdio
        #[arg(long)]
        http: Option<String>,
    },

    /// Send one query to the RAG engine
    #[command(alias = "q")]
    Query {
        /// Question text
        text: String,
    },

    /// Send several queries, one after another
    Batch {
        /// Question texts
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Check whether the RAG engine is reachable
    Health,

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(path) = &cli.config {
        load_config(path).with_context(|| format!("loading {}", path.display()))?
    } else if let Some(path) = find_config_file() {
        load_config(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        get_config()?
    };

    if let Some(base_url) = &cli.base_url {
        config.rag.base_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.rag.timeout_seconds = timeout;
    }

    validate_timeout(config.rag.timeout_seconds).context("invalid RAG timeout")?;

    Ok(config)
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("rag_gateway={}", level)),
    );

    // stdout belongs to command output and the MCP stdio transport
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.is_json() {
        registry.with(fmt_layer.json()).init();
    } else {
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_tracing(&cli, &config);

    if let Some(path) = &cli.config {
        tracing::info!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::Serve { bind } => {
            let gateway = Gateway::from_config(&config)?;
            let addr = bind.unwrap_or_else(|| config.server.bind.clone());
            serve(gateway, &addr).await?;
        }

        Commands::Mcp { http } => {
            let gateway = Gateway::from_config(&config)?;
            let server = McpServer::new(&gateway)?;

            match http {
                Some(addr) => {
                    let (bound_addr, handle) = server.run_http(&addr).await?;
                    tracing::info!("MCP server listening on {}", bound_addr);
                    handle
                        .await
                        .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
                }
                None => server.run().await?,
            }
        }

        Commands::Query { text } => {
            let invoker = RagInvoker::from_config(&config.rag)?;
            println!("{}", invoker.query(&text).await);
        }

        Commands::Batch { texts } => {
            let invoker = RagInvoker::from_config(&config.rag)?;
            print!("{}", invoker.batch_query(&texts).await);
        }

        Commands::Health => {
            let invoker = RagInvoker::from_config(&config.rag)?;
            println!("{}", invoker.health_check().await);
        }

        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            save_config(&Config::default(), &path)?;
            if !cli.quiet {
                println!("Wrote default configuration to {}", path.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_query_command() {
        let cli = Cli::parse_from(["rag-gateway", "query", "what is rag"]);
        match &cli.command {
            Commands::Query { text } => assert_eq!(text, "what is rag"),
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_cli_batch_requires_texts() {
        assert!(Cli::try_parse_from(["rag-gateway", "batch"]).is_err());

        let cli = Cli::parse_from(["rag-gateway", "batch", "a", "b"]);
        match &cli.command {
            Commands::Batch { texts } => assert_eq!(texts, &["a", "b"]),
            _ => panic!("Expected Batch command"),
        }
    }

    #[test]
    fn test_cli_mcp_http_flag() {
        let cli = Cli::parse_from(["rag-gateway", "mcp", "--http", "127.0.0.1:3000"]);
        match &cli.command {
            Commands::Mcp { http } => assert_eq!(http.as_deref(), Some("127.0.0.1:3000")),
            _ => panic!("Expected Mcp command"),
        }

        let cli = Cli::parse_from(["rag-gateway", "mcp"]);
        assert!(matches!(cli.command, Commands::Mcp { http: None }));
    }

    #[test]
    fn test_cli_global_overrides() {
        let cli = Cli::parse_from([
            "rag-gateway",
            "health",
            "--base-url",
            "http://rag:9000",
            "--timeout",
            "5",
        ]);
        assert!(matches!(cli.command, Commands::Health));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        save_config(&Config::default(), &path).unwrap();

        let cli = Cli::parse_from([
            "rag-gateway",
            "--config",
            path.to_str().unwrap(),
            "--base-url",
            "http://rag:9000",
            "--timeout",
            "5",
            "health",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.rag.base_url, "http://rag:9000");
        assert_eq!(config.rag.timeout_seconds, 5);
    }

    #[test]
    fn test_cli_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        save_config(&Config::default(), &path).unwrap();

        let cli = Cli::parse_from([
            "rag-gateway",
            "--config",
            path.to_str().unwrap(),
            "--timeout",
            "0",
            "health",
        ]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(err.to_string().contains("invalid RAG timeout"));

        let mut config = Config::default();
        config.rag.timeout_seconds = 0;
        save_config(&config, &path).unwrap();

        let cli = Cli::parse_from(["rag-gateway", "--config", path.to_str().unwrap(), "health"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn test_cli_serve_bind() {
        let cli = Cli::parse_from(["rag-gateway", "serve", "--bind", "0.0.0.0:9090"]);
        match &cli.command {
            Commands::Serve { bind } => assert_eq!(bind.as_deref(), Some("0.0.0.0:9090")),
            _ => panic!("Expected Serve command"),
        }
    }
}
