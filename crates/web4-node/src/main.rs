//! web4-node — operational CLI for the Web4 LCT ledger.
//!
//! Usage:
//!   web4-node submit <tx.json>     admit a signed transaction
//!   web4-node query <prefix> <key> read one record as JSON
//!   web4-node mine                 seal pending transactions into a block
//!   web4-node verify-chain         re-validate the whole chain
//!
//! Exit codes: 0 success, 1 invalid input, 2 state conflict, 3 I/O error,
//! 4 oracle rejection.
//!
//! Environment: LEDGER_DATA_DIR, LEDGER_DIFFICULTY, LEDGER_MAX_PENDING,
//! LEDGER_BLOCK_TIMEOUT_MS.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use web4_chain::{query, GenesisParams, Ledger, LedgerConfig};
use web4_core::error::{ErrorKind, LedgerError};
use web4_core::transaction::{Transaction, Witness};
use web4_core::types::TimestampNs;
use web4_crypto::Ed25519Signer;
use web4_store::{keys, Store};

// ── CLI definition ───────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "web4-node",
    version,
    about = "Web4 LCT ledger — submit, mine, query, verify"
)]
struct Args {
    /// Directory for the persistent ledger database.
    #[arg(long, global = true, default_value = "~/.web4/data")]
    data_dir: PathBuf,

    /// Miner identity used for block witnesses and the mining reward.
    #[arg(long, global = true, default_value = "miner-local")]
    miner: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Admit a signed transaction (JSON file) to the pending buffer.
    Submit {
        /// Path to the transaction JSON.
        tx: PathBuf,
    },

    /// Read one record: `query <prefix> <key>` (e.g. `query lct <64-hex>`).
    Query { prefix: String, key: String },

    /// Seal the pending transactions into the next block.
    Mine,

    /// Re-derive every block hash and check linkage, PoW, and witnesses.
    VerifyChain,
}

// ── Node key file ────────────────────────────────────────────────────────────

/// Persisted node identity; generated on first run next to the database.
#[derive(Serialize, Deserialize)]
struct NodeKeyFile {
    public_key: String,
    secret_key: String,
}

fn load_or_create_signer(data_dir: &Path) -> anyhow::Result<Ed25519Signer> {
    let path = data_dir.join("node_key.json");
    if path.exists() {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("reading node key {}", path.display()))?;
        let file: NodeKeyFile = serde_json::from_str(&json).context("parsing node key JSON")?;
        let bytes = hex::decode(&file.secret_key).context("decoding node secret key")?;
        let mut secret = [0u8; 32];
        if bytes.len() != 32 {
            anyhow::bail!("node secret key must be 32 bytes");
        }
        secret.copy_from_slice(&bytes);
        return Ok(Ed25519Signer::from_secret_bytes(secret));
    }
    let signer = Ed25519Signer::generate();
    let file = NodeKeyFile {
        public_key: signer.public_key.to_hex(),
        secret_key: hex::encode(signer.secret_bytes()),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&file)?)
        .with_context(|| format!("writing node key {}", path.display()))?;
    info!(path = %path.display(), "generated node key");
    Ok(signer)
}

// ── Pending transaction spool ────────────────────────────────────────────────
//
// The block worker's in-memory buffer does not outlive a CLI invocation, so
// `submit` spools transactions under meta/ and `mine` drains the spool.

fn spool_key(seq: u64) -> Vec<u8> {
    let mut key = keys::meta("pending/");
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

fn spool_push(store: &Store, tx: &Transaction) -> Result<u64, LedgerError> {
    let seq: u64 = store.get(&keys::meta("pending_seq"))?.unwrap_or(0);
    store.put(&spool_key(seq), tx)?;
    store.put(&keys::meta("pending_seq"), &(seq + 1))?;
    Ok(seq)
}

fn spool_drain(store: &Store) -> Result<Vec<Transaction>, LedgerError> {
    let spooled = store.scan_prefix_as::<Transaction>(&keys::meta("pending/"))?;
    for (key, _) in &spooled {
        store.delete_raw(key)?;
    }
    Ok(spooled.into_iter().map(|(_, tx)| tx).collect())
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,web4=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let config = LedgerConfig::default().with_env();
    let store = Store::open(data_dir.join("ledger"))?;
    let mut ledger = Ledger::open(store, config, &GenesisParams::default())?;

    match args.command {
        Command::Submit { tx } => {
            let json = std::fs::read_to_string(&tx)
                .with_context(|| format!("reading transaction {}", tx.display()))?;
            let tx: Transaction =
                serde_json::from_str(&json).context("parsing transaction JSON")?;
            let id = tx.id;
            spool_push(ledger.store(), &tx)?;
            println!("{}", serde_json::json!({ "submitted": id.to_hex() }));
        }

        Command::Query { prefix, key } => match query::query_json(ledger.store(), &prefix, &key)?
        {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => {
                println!("null");
                return Err(LedgerError::RecordNotFound(format!("{prefix}/{key}")).into());
            }
        },

        Command::Mine => {
            let now = now_ns();
            for tx in spool_drain(ledger.store())? {
                if let Err(err) = ledger.submit(tx) {
                    warn!(error = %err, "transaction not admitted");
                }
            }
            let signer = load_or_create_signer(&data_dir)?;
            let head = ledger.head()?;
            let witness = Witness {
                lct_id: web4_crypto::anonymize(&format!("witness:{}", signer.public_key.to_hex())),
                signature: signer.sign(head.hash.as_bytes()),
                timestamp_ns: now,
                confidence: 1.0,
            };
            let started = Instant::now();
            match ledger.mine_pending(&args.miner, vec![witness], now)? {
                Some(block) => {
                    let elapsed = started.elapsed().as_millis() as u64;
                    if elapsed > ledger.config().block_timeout_ms {
                        warn!(elapsed_ms = elapsed, "block sealing exceeded the timeout budget");
                    }
                    println!(
                        "{}",
                        serde_json::json!({
                            "index": block.index,
                            "hash": block.hash.to_hex(),
                            "transactions": block.transactions.len(),
                        })
                    );
                }
                None => println!("{}", serde_json::json!({ "mined": false })),
            }
        }

        Command::VerifyChain => {
            let valid = ledger.is_chain_valid()?;
            println!("{}", serde_json::json!({ "valid": valid }));
            if !valid {
                return Err(LedgerError::OracleRejected("chain validation failed".into()).into());
            }
        }
    }
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<LedgerError>() {
        Some(ledger_err) => match ledger_err.kind() {
            ErrorKind::InvalidInput | ErrorKind::NotFound => 1,
            ErrorKind::Conflict | ErrorKind::Backpressure => 2,
            ErrorKind::Storage => 3,
            ErrorKind::AuthFailure
            | ErrorKind::Unauthorized
            | ErrorKind::CryptoFailure
            | ErrorKind::Timeout => 4,
        },
        // IO / parse failures outside the ledger surface as invalid input
        // unless they came from the filesystem.
        None => {
            if err.downcast_ref::<std::io::Error>().is_some() {
                3
            } else {
                1
            }
        }
    }
}

fn now_ns() -> TimestampNs {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .map(|ns| ns as TimestampNs)
        .unwrap_or_default()
}

/// Expand a leading `~`, then apply the `LEDGER_DATA_DIR` override.
fn resolve_data_dir(flag: &Path) -> PathBuf {
    if let Ok(dir) = std::env::var("LEDGER_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(stripped) = flag.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    flag.to_path_buf()
}
