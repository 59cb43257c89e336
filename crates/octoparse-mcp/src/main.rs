//! Octoparse MCP server: entry point.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use octoparse::Operation;
use octoparse_mcp::cli::{build_request, parse_assignment, render_records};
use octoparse_mcp::config::{resolve_credentials, CredentialArgs};
use octoparse_mcp::protocol::ProtocolHandler;
use octoparse_mcp::session::OctoparseSession;
use octoparse_mcp::tools::ToolRegistry;
use octoparse_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "octoparse-mcp",
    about = "MCP server and CLI for the Octoparse OpenAPI",
    version
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone)]
struct ConnectionArgs {
    /// Path to a JSON credentials file.
    /// Also reads from OCTOPARSE_CREDENTIALS.
    #[arg(long, global = true)]
    credentials: Option<String>,

    /// API base URL (default https://openapi.octoparse.com).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Account username.
    #[arg(long, global = true)]
    username: Option<String>,

    /// Account password.
    #[arg(long, global = true)]
    password: Option<String>,

    /// Pre-issued access token; skips the token endpoint.
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,
}

impl ConnectionArgs {
    fn session(&self) -> anyhow::Result<OctoparseSession> {
        let credentials = resolve_credentials(&CredentialArgs {
            credentials_file: self.credentials.clone(),
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            access_token: self.access_token.clone(),
        })?;
        Ok(OctoparseSession::with_timeout(
            credentials,
            Duration::from_secs(self.timeout_secs),
        ))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Run a single operation and print its records as JSON.
    ///
    /// Example:
    ///   octoparse-mcp call tasks copyTask -p taskGroupId=G1 -p taskId=T1
    Call {
        /// Resource: tasks, cloudExtraction, or data.
        resource: String,

        /// Operation name, e.g. getTaskGroups.
        operation: String,

        /// Scalar parameter as name=value. Repeatable.
        #[arg(short = 'p', long = "param", value_parser = parse_assignment)]
        params: Vec<(String, String)>,

        /// List parameter as name=v1,v2. Repeatable.
        #[arg(short = 'l', long = "list", value_parser = parse_assignment)]
        lists: Vec<(String, String)>,
    },

    /// Check credentials by requesting an access token.
    Validate,

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   octoparse-mcp completions bash > ~/.local/share/bash-completion/completions/octoparse-mcp
    ///   octoparse-mcp completions zsh > ~/.zfunc/_octoparse-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let session = Arc::new(Mutex::new(cli.connection.session()?));
            let handler = ProtocolHandler::new(session);
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Call {
            resource,
            operation,
            params,
            lists,
        } => {
            let request = build_request(&resource, &operation, &params, &lists)?;
            let mut session = cli.connection.session()?;
            let records = session.invoke(&request).await?;
            println!("{}", render_records(&records));
        }

        Commands::Validate => {
            let mut session = cli.connection.session()?;
            let base_url = session.credentials().base_url().to_string();
            match session.acquire_token(true).await {
                Ok(status) => {
                    println!("Credentials valid for {base_url}");
                    println!("  Username:     {}", status.username);
                    println!("  Token source: {:?}", status.token_source);
                }
                Err(e) => {
                    eprintln!("Invalid credentials: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let capabilities = octoparse_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
                "operation_count": Operation::ALL.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "octoparse-mcp", &mut std::io::stdout());
        }

        Commands::Repl => {
            let session = cli.connection.session()?;
            octoparse_mcp::repl::run(session).await?;
        }
    }

    Ok(())
}
