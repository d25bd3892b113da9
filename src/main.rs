use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use petpay::application::engine::PaymentEngine;
use petpay::config::{Cli, Command, GatewayKind, SANDBOX_SECRET, ServeArgs};
use petpay::domain::ports::{SharedOrderStore, SharedPaymentGateway, SharedSubjectRegistry};
use petpay::domain::signature::SigningSecret;
use petpay::infrastructure::gateway::{RazorpayGateway, SandboxGateway};
use petpay::infrastructure::in_memory::{InMemoryOrderStore, InMemorySubjectRegistry};
use petpay::interfaces::http::{self, AppState};
use petpay::interfaces::json::seed_reader::SeedReader;
use petpay::telemetry;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

type Storage = (SharedOrderStore, SharedSubjectRegistry);

#[cfg(feature = "storage-rocksdb")]
fn persistent_storage(db_path: Option<PathBuf>) -> Result<Option<Storage>> {
    let Some(db_path) = db_path else {
        return Ok(None);
    };
    let store = petpay::infrastructure::rocksdb::RocksDBStore::open(&db_path).into_diagnostic()?;
    tracing::info!(path = %db_path.display(), "Using RocksDB storage");
    Ok(Some((Arc::new(store.clone()), Arc::new(store))))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn persistent_storage(db_path: Option<PathBuf>) -> Result<Option<Storage>> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(None)
}

fn open_storage(db_path: Option<PathBuf>) -> Result<Storage> {
    if let Some(storage) = persistent_storage(db_path)? {
        return Ok(storage);
    }
    Ok((
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(InMemorySubjectRegistry::new()),
    ))
}

fn signing_secret(cli_secret: Option<String>, required: bool) -> Result<SigningSecret> {
    match cli_secret {
        Some(secret) if !secret.is_empty() => Ok(SigningSecret::new(secret)),
        _ if required => Err(miette!(
            "--key-secret (or RAZORPAY_KEY_SECRET) is required for the razorpay gateway"
        )),
        _ => {
            tracing::warn!("No key secret configured, using the sandbox secret");
            Ok(SigningSecret::new(SANDBOX_SECRET))
        }
    }
}

fn gateway(args: &ServeArgs, secret: Option<&str>) -> Result<SharedPaymentGateway> {
    match args.gateway {
        GatewayKind::Sandbox => Ok(Arc::new(match &args.key_id {
            Some(key_id) => SandboxGateway::new(key_id.clone()),
            None => SandboxGateway::default(),
        })),
        GatewayKind::Razorpay => {
            let key_id = args.key_id.clone().ok_or_else(|| {
                miette!("--key-id (or RAZORPAY_KEY_ID) is required for the razorpay API")
            })?;
            let key_secret = secret.ok_or_else(|| {
                miette!("--key-secret (or RAZORPAY_KEY_SECRET) is required for the razorpay API")
            })?;
            Ok(Arc::new(RazorpayGateway::new(key_id, key_secret.to_string())))
        }
    }
}

async fn serve(
    cli_secret: Option<String>,
    db_path: Option<PathBuf>,
    args: ServeArgs,
) -> Result<()> {
    let gateway = gateway(&args, cli_secret.as_deref())?;
    let secret = signing_secret(cli_secret, args.gateway == GatewayKind::Razorpay)?;
    let (store, registry) = open_storage(db_path)?;

    if let Some(path) = &args.seed {
        let seed = SeedReader::new(File::open(path).into_diagnostic()?)
            .read()
            .into_diagnostic()?;
        seed.load_into(registry.as_ref()).await.into_diagnostic()?;
    }

    let engine = PaymentEngine::new(store, registry, gateway, secret);

    // Effects queued by a previous run go out before new traffic arrives.
    let report = engine.reconcile().await.into_diagnostic()?;
    if report.failed > 0 {
        tracing::warn!(failed = report.failed, "Some queued side effects are still pending");
    }

    http::serve(
        AppState {
            engine,
            currency: args.currency,
        },
        args.bind,
    )
    .await
    .into_diagnostic()
}

#[actix_web::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(cli.key_secret, cli.db_path, args).await,
        Command::Reconcile => {
            let (store, registry) = open_storage(cli.db_path)?;
            let secret = signing_secret(cli.key_secret, false)?;
            let engine = PaymentEngine::new(
                store,
                registry,
                Arc::new(SandboxGateway::default()),
                secret,
            );
            let report = engine.reconcile().await.into_diagnostic()?;
            println!("{}", serde_json::to_string(&report).into_diagnostic()?);
            Ok(())
        }
        Command::Sign {
            order_id,
            payment_id,
        } => {
            let secret = signing_secret(cli.key_secret, false)?;
            println!("{}", secret.sign(&order_id, &payment_id));
            Ok(())
        }
    }
}
