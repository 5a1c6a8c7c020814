//! Headless dungeon-crawl driver.
//!
//! Reads actions from stdin, one per line, and prints the run history back.
//!
//! ```bash
//! cargo run -p crawl -- --seed t1 --save-dir saves
//! ```

mod commands;
mod headless;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let mut config = headless::parse_config_from_args(&args)?;
    if config.seed.is_none() {
        config = config.with_seed(random_seed());
    }

    headless::run_headless(config).await.map_err(|e| e.into())
}

/// A fresh seed for runs started without one.
fn random_seed() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

fn print_help() {
    println!("crawl - headless dungeon crawl");
    println!();
    println!("Usage: crawl [--seed <seed>] [--save-dir <dir>] [--autosave]");
    println!();
    println!("Environment:");
    println!("  CRAWL_SEED       Seed when --seed is not given (random otherwise)");
    println!("  CRAWL_SAVE_DIR   Directory for #save without a path and auto-saves");
    println!("  CRAWL_AUTOSAVE   Save after every action (true/false)");
    println!("  RUST_LOG         Log filter, e.g. crawl_core=debug");
    println!();
    println!("Type #help once running for the action list.");
}
