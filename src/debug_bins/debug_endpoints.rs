use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use whalewatch::config;
use whalewatch::connectivity::SLOW_PROBE_MS;
use whalewatch::rpc::EndpointRegistry;

#[derive(Parser)]
#[command(name = "debug_endpoints")]
#[command(about = "Probe every configured RPC endpoint once", long_about = None)]
struct Args {
    /// Config file, defaults to the data directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also print the failover order
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

    println!("Endpoint Health Debug Tool\n");
    println!("{}", "=".repeat(80));

    let results = whalewatch::run::check_endpoints(&cfg).await;
    for (name, result) in &results {
        let status = match (&result.error, result.healthy) {
            (None, true) => "healthy".to_string(),
            (None, false) => "unhealthy".to_string(),
            (Some(reason), true) => format!("degraded: {}", reason),
            (Some(reason), false) => format!("unhealthy: {}", reason),
        };
        println!("{:<20} {:>6}ms  {}", name, result.latency_ms, status);
    }

    let healthy = results.iter().filter(|(_, r)| r.healthy).count();
    println!("\n{}", "=".repeat(80));
    println!(
        "{}/{} healthy (slow threshold {}ms)",
        healthy,
        results.len(),
        SLOW_PROBE_MS
    );

    if args.verbose {
        // re-apply the probe outcomes to show the order failover would walk
        let registry = EndpointRegistry::from_config(&cfg.rpc.endpoints);
        for (name, result) in &results {
            registry.record_result(name, result.healthy, result.latency_ms);
        }
        println!("\n[FAILOVER ORDER]");
        for (i, endpoint) in registry.failover_candidates(None).iter().enumerate() {
            println!(
                "{}. {} (priority {}, {}ms)",
                i + 1,
                endpoint.name,
                endpoint.priority,
                endpoint.last_latency_ms
            );
        }
    }

    Ok(())
}
