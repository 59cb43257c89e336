//! Interactive REPL for the Octoparse MCP server.
//!
//! Launch with `octoparse-mcp repl` to enter interactive mode.
//! Type `/help` for available commands, Tab for completion.

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use octoparse::{route, Credentials, Operation, Resource};

use crate::cli::{parse_call_line, render_records};
use crate::session::OctoparseSession;
use crate::tools::ToolRegistry;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/call", "Run an operation: /call <resource> <operation> name=value..."),
    ("/operations", "List operations, optionally for one resource"),
    ("/tools", "List available MCP tools"),
    ("/login", "Switch account: /login <username> <password>"),
    ("/logout", "Clear the cached access token"),
    ("/status", "Show session and token state"),
    ("/info", "Show server capabilities and tools"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// REPL helper for tab completion.
#[derive(Default)]
struct OctoparseHelper;

impl OctoparseHelper {
    /// Candidates for the word being typed after `/call` or `/operations`.
    fn complete_args(cmd: &str, args: &str) -> Vec<String> {
        let words: Vec<&str> = args.split(' ').collect();
        match (cmd, words.as_slice()) {
            ("/call" | "/operations", [_]) => Resource::ALL
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
            ("/call", [resource, _]) => resource
                .parse::<Resource>()
                .map(|r| r.operations().iter().map(|op| op.as_str().to_string()).collect())
                .unwrap_or_default(),
            ("/call", [resource, operation, ..]) => {
                match octoparse::OperationRequest::parse(resource, operation) {
                    Ok(request) => route(request.operation())
                        .params
                        .iter()
                        .map(|p| format!("{}=", p.input))
                        .collect(),
                    Err(_) => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }
}

impl Completer for OctoparseHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let current = args.rsplit(' ').next().unwrap_or("");
        let start = input.len() - current.len();

        let matches: Vec<Pair> = Self::complete_args(cmd, args)
            .into_iter()
            .filter(|c| c.starts_with(current))
            .map(|c| {
                let replacement = if c.ends_with('=') { c.clone() } else { format!("{c} ") };
                Pair {
                    display: c,
                    replacement,
                }
            })
            .collect();
        Ok((start, matches))
    }
}

impl Hinter for OctoparseHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for OctoparseHelper {}
impl Validator for OctoparseHelper {}
impl Helper for OctoparseHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Run the interactive REPL against a session.
pub async fn run(mut session: OctoparseSession) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1moctoparse-mcp v{}\x1b[0m \x1b[90m{}\x1b[0m",
        env!("CARGO_PKG_VERSION"),
        session.credentials().base_url()
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<OctoparseHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(OctoparseHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".octoparse_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let prompt = " \x1b[36moctoparse>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "info" => cmd_info(),
                    "tools" => cmd_tools(),
                    "operations" | "ops" => cmd_operations(args),
                    "call" => cmd_call(args, &mut session).await,
                    "login" => cmd_login(args, &mut session),
                    "logout" => cmd_logout(&mut session),
                    "status" => cmd_status(&session),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<14} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completes commands, resources, operations, and parameter names.");
    eprintln!("       List parameters take comma-separated values: cloudTaskIds=A,B");
    eprintln!();
}

fn cmd_info() {
    let capabilities = crate::types::InitializeResult::default_result();
    let tools = ToolRegistry::list_tools();
    eprintln!();
    eprintln!(
        "  Server:     {} v{}",
        capabilities.server_info.name, capabilities.server_info.version
    );
    eprintln!("  Protocol:   {}", capabilities.protocol_version);
    eprintln!("  Tools:      {}", tools.len());
    eprintln!("  Operations: {}", Operation::ALL.len());
    eprintln!();
}

fn cmd_tools() {
    let tools = ToolRegistry::list_tools();
    eprintln!();
    eprintln!("  {} MCP tools available:", tools.len());
    eprintln!();
    for tool in &tools {
        eprintln!(
            "    {:<28} {}",
            tool.name,
            tool.description.as_deref().unwrap_or("")
        );
    }
    eprintln!();
}

fn cmd_operations(args: &str) {
    let resources: Vec<Resource> = if args.is_empty() {
        Resource::ALL.to_vec()
    } else {
        match args.parse::<Resource>() {
            Ok(r) => vec![r],
            Err(e) => {
                eprintln!("  {e}");
                return;
            }
        }
    };

    eprintln!();
    for resource in resources {
        eprintln!("  \x1b[1m{resource}\x1b[0m");
        for op in resource.operations() {
            let r = route(op);
            let params: Vec<String> = r
                .params
                .iter()
                .map(|p| match p.default {
                    Some(d) => format!("{}={d}", p.input),
                    None if p.is_required() => format!("{}*", p.input),
                    None => format!("{}[]", p.input),
                })
                .collect();
            eprintln!(
                "    {:<30} {:<5} {:<34} {}",
                op.as_str(),
                r.method.as_str(),
                r.path,
                params.join(" ")
            );
        }
        eprintln!();
    }
}

async fn cmd_call(args: &str, session: &mut OctoparseSession) {
    let request = match parse_call_line(args) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("  {e}");
            return;
        }
    };

    match session.invoke(&request).await {
        Ok(records) => println!("{}", render_records(&records)),
        Err(e) => eprintln!("  \x1b[31m{e}\x1b[0m"),
    }
}

fn cmd_login(args: &str, session: &mut OctoparseSession) {
    let mut words = args.split_whitespace();
    let (username, password) = match (words.next(), words.next()) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            eprintln!("  Usage: /login <username> <password>");
            return;
        }
    };

    let mut credentials = Credentials::new(username, password);
    credentials.base_url = session.credentials().base_url.clone();
    session.set_credentials(credentials);
    eprintln!("  Logged in as {username}. A token is fetched on the next call.");
}

fn cmd_logout(session: &mut OctoparseSession) {
    if session.clear_token() {
        eprintln!("  Cached token cleared.");
    } else {
        eprintln!("  No cached token.");
    }
}

fn cmd_status(session: &OctoparseSession) {
    let status = session.status();
    eprintln!();
    eprintln!("  Base URL:     {}", status.base_url);
    eprintln!("  Username:     {}", status.username);
    eprintln!("  Token source: {:?}", status.token_source);
    if let Some(at) = status.token_acquired_at {
        eprintln!("  Acquired at:  {}", at.to_rfc3339());
    }
    eprintln!("  Calls:        {} ({} failed)", status.calls, status.failed_calls);
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_resources_and_operations() {
        let resources = OctoparseHelper::complete_args("/call", "");
        assert_eq!(resources, vec!["tasks", "cloudExtraction", "data"]);

        let ops = OctoparseHelper::complete_args("/call", "data ");
        assert_eq!(ops.len(), 5);
        assert!(ops.contains(&"removeData".to_string()));

        let params = OctoparseHelper::complete_args("/call", "tasks copyTask ");
        assert_eq!(params, vec!["taskGroupId=", "taskId="]);

        assert!(OctoparseHelper::complete_args("/status", "").is_empty());
    }
}
