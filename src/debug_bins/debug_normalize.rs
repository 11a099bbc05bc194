use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use whalewatch::config;
use whalewatch::rpc::{Connector, EndpointRegistry, HttpConnector, LedgerClient};
use whalewatch::transactions::{normalize, NormalizerConfig};

#[derive(Parser)]
#[command(name = "debug_normalize")]
#[command(about = "Fetch one transaction and print the normalized transfer", long_about = None)]
struct Args {
    /// Transaction signature
    signature: String,

    /// Config file, defaults to the data directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint name to query, defaults to the most preferred one
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Print every instruction as well
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => config::load_config_from_path(path)?,
        None => config::load_config()?,
    };

    let registry = EndpointRegistry::from_config(&cfg.rpc.endpoints);
    let endpoint = match &args.endpoint {
        Some(name) => registry.get(name),
        None => registry.best(),
    }
    .ok_or("no matching endpoint configured")?;

    println!("Querying {} ({})", endpoint.name, endpoint.http_url);
    let client = HttpConnector::from_config(&cfg).connect(&endpoint).await?;

    let Some(tx) = client.get_parsed_transaction(&args.signature).await? else {
        println!("Transaction {} not found", args.signature);
        return Ok(());
    };

    println!("{}", "=".repeat(80));
    println!("Slot: {}", tx.slot);
    println!("Failed: {}", tx.is_failed());
    println!("Fee payer: {}", tx.fee_payer().unwrap_or("-"));
    println!(
        "Instructions: {} top-level, {} inner groups",
        tx.instructions.len(),
        tx.inner_instructions.len()
    );

    if args.verbose {
        for (i, ix) in tx.all_instructions().enumerate() {
            println!("  {}. {}", i + 1, ix.program_id());
        }
    }

    println!("{}", "=".repeat(80));
    match normalize(&tx, &NormalizerConfig::from(&cfg.monitor)) {
        Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
        None => println!("No token transfer found"),
    }

    Ok(())
}
