//! Beedash CLI - wallet session over a local wallet bridge
//!
//! Every command opens a session against the bridge, restores an already
//! authorized account, performs one intent and prints JSON:
//!   beedash status                 → session snapshot
//!   beedash connect                → prompt the wallet, print snapshot
//!   beedash switch <chain>         → request a network switch (id or 0x id)
//!   beedash send <to> <amount>     → transfer, print the history record
//!   beedash watch                  → stream snapshots until Ctrl-C
//!
//! Configuration:
//!   BEEDASH_PROVIDER_URL (or --provider) points at the bridge, e.g. Frame on
//!   http://127.0.0.1:1248. A `.env` file in the working directory is loaded first.

use anyhow::{anyhow, bail, Context};
use beedash::logging::init_logging;
use beedash::{
    install_signal_handlers, networks, ChainId, DashConfig, Eip1193Provider, HttpTransport,
    SessionManager, TransactionLog,
};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::debug;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("beedash {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let Some(command) = opts.command.clone() else {
        print_usage();
        return;
    };

    let result = tokio::runtime::Runtime::new()
        .context("failed to start tokio runtime")
        .and_then(|rt| rt.block_on(run(&command, &opts)));

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": format!("{e:#}") }), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let text = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    text.unwrap_or_else(|_| value.to_string())
}

async fn run(command: &str, opts: &ParsedArgs) -> anyhow::Result<Value> {
    match command {
        "networks" => cmd_networks(),
        "status" => cmd_status(opts).await,
        "connect" => cmd_connect(opts).await,
        "balance" => cmd_balance(opts).await,
        "switch" => cmd_switch(opts).await,
        "send" => cmd_send(opts).await,
        "watch" => cmd_watch(opts).await,
        other => bail!("Unknown command: {}", other),
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    args: Vec<String>,
    provider: Option<String>,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv();

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--pretty" => opts.pretty = true,
                "--provider" | "-p" => {
                    if i + 1 < args.len() {
                        opts.provider = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => debug!(flag = %arg, "ignoring unknown flag"),
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.args = positional;
        opts
    }

    fn arg(&self, index: usize, name: &str) -> anyhow::Result<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("missing argument <{}>", name))
    }
}

/// Variables already set in the environment win over `.env` entries.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else { return };
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

fn print_usage() {
    println!(
        r#"beedash - wallet session dashboard

USAGE:
    beedash <command> [args] [options]

COMMANDS:
    networks                List known chains
    status                  Restore an authorized session and print it
    connect                 Request wallet access and print the session
    balance                 Print the connected account's balance
    switch <chain>          Switch the wallet to a chain (137 or 0x89)
    send <to> <amount>      Send native currency, e.g. send 0x5aAe... 0.1
    watch                   Print session changes until Ctrl-C

OPTIONS:
    --provider, -p <url>    Wallet bridge URL (env: BEEDASH_PROVIDER_URL)
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENVIRONMENT:
    BEEDASH_PROVIDER_URL    Wallet bridge endpoint
    BEEDASH_REFRESH_SECS    Balance refresh period (default 15)
    BEEDASH_EVENT_POLL_MS   Account/chain poll period (default 2000)
    BEEDASH_RECEIPT_POLL_MS Receipt poll period (default 1000)
    BEEDASH_LOG_JSON=1      JSON logs on stderr

EXAMPLES:
    beedash status --provider http://127.0.0.1:1248
    beedash switch 11155111
    beedash send 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed 0.01
    beedash watch | jq .balance
"#
    );
}

fn load_config(opts: &ParsedArgs) -> anyhow::Result<DashConfig> {
    let mut config = DashConfig::from_env()?;
    if let Some(url) = &opts.provider {
        config = config.with_provider_url(url.clone());
    }
    Ok(config)
}

async fn open_session(opts: &ParsedArgs) -> anyhow::Result<SessionManager> {
    let config = load_config(opts)?;
    let transport = HttpTransport::new(config.provider_url.clone());
    let provider = Arc::new(Eip1193Provider::new(transport, &config));
    let session = SessionManager::new(provider, config);
    session.start().await?;
    Ok(session)
}

fn cmd_networks() -> anyhow::Result<Value> {
    let chains: Vec<Value> = networks::all()
        .map(|c| {
            json!({
                "id": c.id,
                "hex_id": c.hex_id(),
                "name": c.display_name,
                "symbol": c.native_symbol,
                "rpc": c.rpc_endpoints,
                "explorer": c.explorer_base_url,
            })
        })
        .collect();
    Ok(json!({ "networks": chains, "count": chains.len() }))
}

async fn cmd_status(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let session = open_session(opts).await?;
    Ok(serde_json::to_value(session.snapshot())?)
}

async fn cmd_connect(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let session = open_session(opts).await?;
    session.connect().await?;
    Ok(serde_json::to_value(session.snapshot())?)
}

async fn cmd_balance(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let session = open_session(opts).await?;
    let snapshot = session.snapshot();
    let account = snapshot.account.ok_or_else(|| anyhow!("wallet not connected; run 'beedash connect'"))?;
    let explorer = snapshot.chain_id.map(|id| networks::resolve(id).explorer_address_url(&account.to_string()));
    Ok(json!({
        "account": account,
        "chain_id": snapshot.chain_id,
        "balance": snapshot.balance,
        "symbol": snapshot.symbol,
        "explorer_url": explorer,
    }))
}

async fn cmd_switch(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let target: ChainId = opts.arg(0, "chain")?.parse()?;
    let session = open_session(opts).await?;
    session.switch_network(target).await?;
    let chain = networks::resolve(target);
    Ok(json!({ "requested": target, "name": chain.display_name }))
}

async fn cmd_send(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let to = opts.arg(0, "to")?;
    let amount = opts.arg(1, "amount")?;
    let session = open_session(opts).await?;
    let outcome = session.send_transaction(to, amount).await?;

    let mut log = TransactionLog::new();
    let record = log.record(&outcome);
    Ok(json!({
        "record": record,
        "explorer_url": record.explorer_url(),
        "balance": session.snapshot().balance,
    }))
}

async fn cmd_watch(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let session = open_session(opts).await?;
    let shutdown = install_signal_handlers();
    let mut stop = shutdown.subscribe();
    let mut snapshots = session.subscribe();
    let pretty = opts.pretty;

    println!("{}", render(&serde_json::to_value(session.snapshot())?, pretty));
    loop {
        tokio::select! {
            _ = stop.recv() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                println!("{}", render(&serde_json::to_value(snapshot)?, pretty));
            }
        }
    }
    session.shutdown();
    Ok(json!({ "stopped": true }))
}
