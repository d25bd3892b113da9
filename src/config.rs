use crate::domain::money::Currency;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "PETPAY_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Secret shared with the payment provider for callback signatures.
    #[arg(long, global = true, env = "RAZORPAY_KEY_SECRET", hide_env_values = true)]
    pub key_secret: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the payment API.
    Serve(ServeArgs),
    /// Dispatch side effects left queued by earlier captures, then exit.
    Reconcile,
    /// Print the signature the provider would send for a payment.
    Sign {
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        payment_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GatewayKind {
    /// Issues orders locally without calling the provider.
    Sandbox,
    Razorpay,
}

#[derive(Debug, clap::Args)]
pub struct ServeArgs {
    #[arg(long, env = "PETPAY_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    #[arg(long, value_enum, env = "PETPAY_GATEWAY", default_value = "sandbox")]
    pub gateway: GatewayKind,

    /// Public key id, required for the razorpay gateway.
    #[arg(long, env = "RAZORPAY_KEY_ID")]
    pub key_id: Option<String>,

    #[arg(long, env = "PETPAY_CURRENCY", default_value = "INR")]
    pub currency: Currency,

    /// JSON file of pets and shelters to load at startup.
    #[arg(long, env = "PETPAY_SEED")]
    pub seed: Option<PathBuf>,
}

/// Key used when no secret is configured, for local sandbox runs only.
pub const SANDBOX_SECRET: &str = "petpay_sandbox_secret";
