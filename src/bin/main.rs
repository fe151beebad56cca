//! missing-events CLI - wallet side of the accountsChanged repro
//!
//! Session state lives in the data directory, so one-shot commands chain:
//!   missing-events pair                  → pair with the loopback dapp
//!   missing-events emit 2 1              → chainChanged + accountsChanged (devnet, first address)
//!   missing-events reset                 → disconnect everything
//!
//! Interactive:
//!   missing-events repl
//!
//! Configuration (lowest to highest priority):
//!   .env file → MISSING_EVENTS_* environment → command-line flags

use anyhow::{anyhow, Context, Result};
use missing_events::app::view;
use missing_events::config::DEFAULT_PROJECT_ID;
use missing_events::logging::init_logging;
use missing_events::{
    install_signal_handlers, AppConfig, AppController, AppStep, KeyStore, LocalConnector, LoopbackDapp, PairingUri,
    WalletKit,
};
use serde_json::{json, Value};
use std::env;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging();

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("missing-events {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let Some(command) = opts.command.clone() else {
        print_usage();
        return;
    };

    let result = tokio::runtime::Runtime::new()
        .context("Failed to create runtime")
        .and_then(|rt| rt.block_on(dispatch(&command, &opts)));

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", format_json(&output, pretty)),
        Err(e) => {
            eprintln!("{}", format_json(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

async fn dispatch(command: &str, opts: &ParsedArgs) -> Result<Value> {
    match command {
        "status" => cmd_status(opts).await,
        "pair" => cmd_pair(opts).await,
        "emit" => cmd_emit(opts).await,
        "reset" => cmd_reset(opts).await,
        "accounts" => cmd_accounts(),
        "uri" => Ok(json!({"uri": fresh_uri().to_string()})),
        "repl" => cmd_repl(opts).await,
        cmd => Err(anyhow!("Unknown command: {}", cmd)),
    }
}

fn format_json(value: &Value, pretty: bool) -> String {
    let formatted = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    formatted.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    args: Vec<String>,
    project_id: Option<String>,
    data_dir: Option<String>,
    timeout_secs: Option<u64>,
    proposal_delay_ms: Option<u64>,
    memory: bool,
    silent: bool,
    // Output options
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv(".env");

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = args.get(i + 1).cloned();
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--memory" => opts.memory = true,
                "--silent" => opts.silent = true,
                "--project-id" | "-p" => {
                    opts.project_id = value;
                    i += 1;
                }
                "--data-dir" | "-d" => {
                    opts.data_dir = value;
                    i += 1;
                }
                "--timeout" | "-t" => {
                    opts.timeout_secs = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "--delay" => {
                    opts.proposal_delay_ms = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => debug!("Ignoring unknown flag {}", arg),
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.args = positional;

        // Environment (lower priority than CLI args)
        if opts.project_id.is_none() {
            opts.project_id = env_value("MISSING_EVENTS_PROJECT_ID");
        }
        if opts.data_dir.is_none() {
            opts.data_dir = env_value("MISSING_EVENTS_DATA_DIR");
        }
        if opts.timeout_secs.is_none() {
            opts.timeout_secs = env_value("MISSING_EVENTS_TIMEOUT").and_then(|v| v.parse().ok());
        }
        if opts.proposal_delay_ms.is_none() {
            opts.proposal_delay_ms = env_value("MISSING_EVENTS_PROPOSAL_DELAY_MS").and_then(|v| v.parse().ok());
        }

        opts
    }
}

/// `KEY=value` lines; variables already set win
fn load_dotenv(path: &str) {
    let Ok(contents) = std::fs::read_to_string(path) else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && env::var(key.trim()).is_err() {
                env::set_var(key.trim(), value);
            }
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn print_usage() {
    println!(
        r#"missing-events - pair with a dapp, emit chainChanged + accountsChanged

USAGE:
    missing-events <command> [args] [options]

COMMANDS:
    status                  Show the current step (init/pair/sendEvents)
    pair [uri]              Pair using a wc: URI (fresh loopback URI if omitted)
    emit <chain> <account>  Emit chainChanged then accountsChanged (index or value)
    reset                   Disconnect all sessions and start over
    accounts                List wallet addresses and CAIP-10 accounts
    uri                     Print a fresh loopback pairing URI
    repl                    Interactive mode

OPTIONS:
    --project-id, -p <id>   Project id (env: MISSING_EVENTS_PROJECT_ID)
    --data-dir, -d <path>   Session store directory (env: MISSING_EVENTS_DATA_DIR)
    --timeout, -t <secs>    Proposal timeout, default 10 (env: MISSING_EVENTS_TIMEOUT)
    --delay <ms>            Loopback proposal delay (env: MISSING_EVENTS_PROPOSAL_DELAY_MS)
    --silent                Loopback dapp never sends a proposal
    --memory                Keep sessions in memory only

OUTPUT OPTIONS:
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

LOGGING:
    RUST_LOG=debug          Log filter (default: info)
    MISSING_EVENTS_LOG_JSON=1  JSON log lines on stderr

EXAMPLES:
    missing-events pair
    missing-events emit solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1 1
    missing-events status --json | jq .step
"#
    );
}

fn build_config(opts: &ParsedArgs) -> Result<AppConfig> {
    let mut config = AppConfig::new(opts.project_id.as_deref().unwrap_or(DEFAULT_PROJECT_ID));
    if let Some(secs) = opts.timeout_secs {
        config = config.with_proposal_timeout(Duration::from_secs(secs));
    }
    if !opts.memory {
        let data_dir = match &opts.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .context("No local data directory; pass --data-dir or --memory")?
                .join("missing-events"),
        };
        config = config.with_data_dir(data_dir);
    }
    Ok(config)
}

async fn build_app(opts: &ParsedArgs) -> Result<AppController> {
    let config = build_config(opts)?;
    let mut dapp = LoopbackDapp::default();
    if let Some(ms) = opts.proposal_delay_ms {
        dapp = dapp.with_delay(Duration::from_millis(ms));
    }
    if opts.silent {
        dapp.send_proposal = false;
    }

    let keystore = KeyStore::embedded().context("Failed to load wallet keys")?;
    let mut app = AppController::new(WalletKit::new(config, Arc::new(LocalConnector::new(dapp))), keystore);
    // A failed init check stays visible in the error slot
    let _ = app.load().await;
    Ok(app)
}

fn fresh_uri() -> PairingUri {
    let now = chrono::Utc::now();
    let entropy = format!("{}-{}", now.timestamp_nanos_opt().unwrap_or_default(), std::process::id());
    PairingUri::generate(entropy.as_bytes(), now.timestamp())
}

/// Pick from `options` by 1-based index, otherwise take the value as typed
fn choose(input: &str, options: &[String]) -> String {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|n| options.get(n))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

fn state_json(app: &AppController) -> Value {
    let state = app.state();
    let mut out = json!({"step": state.step.name(), "error": state.error});
    if let AppStep::SendEvents { session, emitter } = &state.step {
        out["session"] = json!({
            "topic": session.topic,
            "peer": session.peer_name(),
            "expiry": session.expiry,
        });
        out["chains"] = json!(emitter.chains);
        out["accounts"] = json!(emitter.accounts);
        out["events"] = json!(emitter.events);
    }
    out
}

async fn cmd_status(opts: &ParsedArgs) -> Result<Value> {
    let app = build_app(opts).await?;
    Ok(state_json(&app))
}

async fn cmd_pair(opts: &ParsedArgs) -> Result<Value> {
    let mut app = build_app(opts).await?;
    let uri = opts.args.first().cloned().unwrap_or_else(|| fresh_uri().to_string());
    app.pair(&uri).await?;
    Ok(state_json(&app))
}

async fn cmd_emit(opts: &ParsedArgs) -> Result<Value> {
    let (chain, account) = match opts.args.as_slice() {
        [chain, account, ..] => (chain.as_str(), account.as_str()),
        _ => return Err(anyhow!("Usage: missing-events emit <chain> <account>")),
    };
    let mut app = build_app(opts).await?;
    let AppStep::SendEvents { emitter, .. } = app.step() else {
        return Err(anyhow!("No active session; run 'missing-events pair' first"));
    };
    let chain = choose(chain, &emitter.chains);
    let account = choose(account, &emitter.accounts);

    let events = app.send_events(&chain, &account).await?;
    Ok(json!({"emitted": events}))
}

async fn cmd_reset(opts: &ParsedArgs) -> Result<Value> {
    let mut app = build_app(opts).await?;
    let report = app.reset().await;
    let failed: Vec<String> = report.failed.iter().map(ToString::to_string).collect();
    Ok(json!({
        "disconnected": report.disconnected,
        "failed": failed,
        "step": app.step().name(),
    }))
}

fn cmd_accounts() -> Result<Value> {
    let keystore = KeyStore::embedded().context("Failed to load wallet keys")?;
    let keys: Vec<Value> = keystore
        .keypairs()
        .iter()
        .map(|k| json!({"address": k.address(), "public_key": hex::encode(k.public_key())}))
        .collect();
    Ok(json!({
        "keys": keys,
        "accounts": keystore.accounts_for(missing_events::core::constants::chains::ALL),
    }))
}

async fn cmd_repl(opts: &ParsedArgs) -> Result<Value> {
    println!("missing-events REPL - type 'help' or 'quit'\n");

    let shutdown = install_signal_handlers();
    let mut app = build_app(opts).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("{}", view::render(app.state()));
        print!("missing-events> ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = shutdown.wait() => break,
        };
        let Some(line) = line else { break };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "exit" | "q") {
            break;
        }

        tokio::select! {
            _ = repl_command(&mut app, input) => {}
            _ = shutdown.wait() => {
                info!("Interrupted");
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(json!({"status": "exited", "step": app.step().name()}))
}

async fn repl_command(app: &mut AppController, input: &str) {
    let parts: Vec<&str> = input.split_whitespace().collect();
    match parts.as_slice() {
        ["help"] | ["?"] => {
            println!("Commands:");
            println!("  pair [uri]              - Pair (fresh loopback URI if omitted)");
            println!("  wc:...                  - Same as pair <uri>");
            println!("  emit <chain> <account>  - Send chainChanged + accountsChanged (index or value)");
            println!("  reset                   - Disconnect all sessions");
            println!("  accounts                - Wallet addresses");
            println!("  uri                     - Print a fresh loopback URI");
            println!("  quit                    - Exit");
        }
        ["pair"] => {
            let uri = fresh_uri().to_string();
            println!("Pairing with {}", uri);
            let _ = app.pair(&uri).await;
        }
        ["pair", uri] => {
            let _ = app.pair(uri).await;
        }
        [uri] if uri.starts_with("wc:") => {
            let _ = app.pair(uri).await;
        }
        ["emit", chain, account] => {
            let (chain, account) = match app.step() {
                AppStep::SendEvents { emitter, .. } => (choose(chain, &emitter.chains), choose(account, &emitter.accounts)),
                _ => (chain.to_string(), account.to_string()),
            };
            if let Ok(events) = app.send_events(&chain, &account).await {
                for event in &events {
                    println!("sent {}", format_json(&json!(event), false));
                }
            }
        }
        ["reset"] => {
            let report = app.reset().await;
            println!("Disconnected {} session(s), {} failed", report.disconnected.len(), report.failed.len());
        }
        ["accounts"] => {
            for address in app.keystore().addresses() {
                println!("  {}  {}", view::shorten_address(&address), address);
            }
        }
        ["uri"] => println!("{}", fresh_uri()),
        [cmd, ..] => println!("Unknown: {}. Type 'help'.", cmd),
        [] => {}
    }
}
