//! `put`/`get`/`delete` front-end for a node's KV HTTP surface (spec §4.11,
//! §6 "CLI"). Grounded in `original_source/ex03/cli/cli.py`: same node-name
//! validation (`NODE-\d+`, case-insensitive, or a bare integer), same
//! status-prefixed JSON output, same "0 only on a 2xx response" exit
//! convention. Uses `clap` (derive) for argument parsing, matching the
//! pack's `other_examples` convention, and `reqwest`'s blocking client
//! since this binary has no reason to run an async runtime of its own.

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(about = "Command-line client for a node's key/value store")]
struct Cli {
    /// Comma-separated list of node hostnames, in the same order as the
    /// cluster's address list (spec §4.11, "the same addressing convention
    /// as node-to-node transport"). A node identifier indexes into this
    /// list.
    #[arg(long, env = "NODE_HOSTS")]
    node_hosts: String,

    /// HTTP port every node's store surface listens on.
    #[arg(long, env = "API_PORT", default_value_t = 8080)]
    api_port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sets `key` to `value` on `node`.
    Put {
        node: String,
        key: String,
        value: String,
    },
    /// Gets `key` from `node`.
    Get { node: String, key: String },
    /// Deletes `key` from `node`.
    Delete { node: String, key: String },
}

/// Parses a node identifier: a bare integer, or `NODE-{n}` case-insensitively
/// (spec §6 "CLI").
fn parse_node_index(node: &str) -> Result<u32> {
    if let Ok(idx) = node.parse::<u32>() {
        return Ok(idx);
    }
    let lower = node.to_ascii_lowercase();
    let suffix = lower
        .strip_prefix("node-")
        .with_context(|| format!("invalid node identifier: {node}"))?;
    suffix
        .parse::<u32>()
        .with_context(|| format!("invalid node identifier: {node}"))
}

fn node_url(hosts: &str, api_port: u16, node: &str) -> Result<String> {
    let idx = parse_node_index(node)? as usize;
    let hosts: Vec<&str> = hosts.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    let host = hosts
        .get(idx)
        .with_context(|| format!("node index {idx} is out of range for {} configured hosts", hosts.len()))?;
    Ok(format!("http://{host}:{api_port}"))
}

/// Parses a CLI value argument into the dynamically-typed JSON value the
/// original's `Union[str, int, float, bool]` parameter models (spec §6
/// "CLI", `put` additionally takes a value...).
fn parse_value(raw: &str) -> serde_json::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return serde_json::Value::Bool(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return serde_json::json!(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return serde_json::json!(f);
    }
    serde_json::Value::String(raw.to_string())
}

fn report(resp: reqwest::blocking::Response) -> Result<bool> {
    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
    println!("{} {body}", status.as_u16());
    Ok(status.is_success())
}

fn run(cli: Cli) -> Result<bool> {
    let client = reqwest::blocking::Client::new();

    match cli.command {
        Command::Put { node, key, value } => {
            let url = node_url(&cli.node_hosts, cli.api_port, &node)?;
            let resp = client
                .put(format!("{url}/store/{key}"))
                .json(&serde_json::json!({ "value": parse_value(&value) }))
                .send()
                .context("request to node failed")?;
            report(resp)
        }
        Command::Get { node, key } => {
            let url = node_url(&cli.node_hosts, cli.api_port, &node)?;
            let resp = client
                .get(format!("{url}/store/{key}"))
                .send()
                .context("request to node failed")?;
            report(resp)
        }
        Command::Delete { node, key } => {
            let url = node_url(&cli.node_hosts, cli.api_port, &node)?;
            let resp = client
                .delete(format!("{url}/store/{key}"))
                .send()
                .context("request to node failed")?;
            report(resp)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
