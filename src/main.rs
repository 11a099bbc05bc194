use whalewatch::{
    arguments::{set_cmd_args, Arguments},
    logger::{self, LogTag},
    run::{self, RunOptions},
};

/// Main entry point for WhaleWatch
///
/// Default mode runs the ingestion pipeline until Ctrl-C.
/// `--check-endpoints` probes every configured endpoint once and exits.
#[tokio::main]
async fn main() {
    set_cmd_args(std::env::args().collect());
    let args = Arguments::from_env();

    // Logger needs the logs directory for its file
    if let Err(e) = whalewatch::paths::ensure_all_directories() {
        eprintln!("❌ Failed to create required directories: {}", e);
        std::process::exit(1);
    }
    logger::init();

    let options = RunOptions::from(&args);

    if args.check_endpoints {
        let config = match run::load_and_init_config(&options) {
            Ok(config) => config,
            Err(e) => {
                logger::error(LogTag::System, &format!("❌ {:#}", e));
                std::process::exit(1);
            }
        };
        let results = run::check_endpoints(&config).await;
        let healthy = results.iter().filter(|(_, r)| r.healthy).count();
        for (name, result) in &results {
            match &result.error {
                None => println!("✅ {:<20} {}ms", name, result.latency_ms),
                Some(e) if result.healthy => {
                    println!("⚠️  {:<20} {}ms ({})", name, result.latency_ms, e)
                }
                Some(e) => println!("❌ {:<20} {}", name, e),
            }
        }
        println!("{}/{} endpoints healthy", healthy, results.len());
        logger::flush();
        std::process::exit(if healthy > 0 { 0 } else { 1 });
    }

    if let Err(e) = run::run_bot(options).await {
        logger::error(LogTag::System, &format!("❌ WhaleWatch failed: {:#}", e));
        logger::flush();
        std::process::exit(1);
    }
}
