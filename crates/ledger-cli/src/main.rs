use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a block with the node's pending transactions
    Mine,
    /// Print the node's full chain
    Chain,
    /// Ask the node whether its chain is valid
    Valid,
    /// Submit a transaction
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        receiver: String,
        /// Amount
        #[arg(long)]
        amount: f64,
    },
    /// Register peers with the node
    Connect {
        /// Peer URLs, e.g. http://127.0.0.1:5001
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Make the node adopt the longest valid chain among its peers
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    receiver: String,
    amount: serde_json::Number,
}

#[derive(Serialize)]
struct Nodes {
    nodes: Vec<String>,
}

/// Whole amounts go out as JSON integers, everything else as floats.
fn amount_number(amount: f64) -> Result<serde_json::Number> {
    if amount.fract() == 0.0 && amount >= 0.0 && amount <= u64::MAX as f64 {
        return Ok((amount as u64).into());
    }
    serde_json::Number::from_f64(amount).context("amount must be a finite number")
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    let body: serde_json::Value = res.json().await.context("node returned a non-JSON body")?;
    println!("status: {status}");
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = Client::new();
    debug!(node, cmd = ?cli.cmd, "sending request");

    let res = match cli.cmd {
        Command::Mine => client.get(format!("{node}/mine_block")).send().await?,
        Command::Chain => client.get(format!("{node}/get_chain")).send().await?,
        Command::Valid => client.get(format!("{node}/is_valid")).send().await?,
        Command::Submit {
            sender,
            receiver,
            amount,
        } => {
            let tx = Tx {
                sender,
                receiver,
                amount: amount_number(amount)?,
            };
            client
                .post(format!("{node}/add_transaction"))
                .json(&tx)
                .send()
                .await?
        }
        Command::Connect { nodes } => {
            client
                .post(format!("{node}/connect_node"))
                .json(&Nodes { nodes })
                .send()
                .await?
        }
        Command::Resolve => client.get(format!("{node}/replace_chain")).send().await?,
    };
    print_response(res).await
}
