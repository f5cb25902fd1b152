//! Collect facts and the startup configuration from a Cisco IOS router.
//!
//! Prompts for the router's name and credentials, writes a temporary hosts
//! file for it, then:
//!
//! - runs the facts getter and saves the result to `<host>_facts.txt`
//! - fetches all configurations and saves the startup one to `<host>.cfg`
//!
//! # Usage
//!
//! ```bash
//! cargo run --example ios_facts
//! cargo run --example ios_facts -- --output-dir /tmp/backups
//! ```

use std::env;
use std::path::PathBuf;

use ferrotask::prompt::prompt_device;
use ferrotask::result::print_result;
use ferrotask::task::{ConfigRetrieve, Get, Runner, WriteFile};
use ferrotask::transient::TransientInventory;
use ferrotask::{AggregatedResult, Inventory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug for session traces
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let device = prompt_device().await?;
    let host = device.name().to_string();
    let transient = TransientInventory::write(&Inventory::new().with_device(device))?;
    let mut runner = Runner::builder(transient.load()?)
        .num_workers(args.workers)
        .build();

    let facts_result = runner.run(&Get::facts()).await;
    let facts = json_payload(&facts_result, &host);
    let facts_file = args.output_dir.join(format!("{}_facts.txt", host));
    let write_facts = runner
        .run(&WriteFile::new(facts_file, serde_json::to_string(&facts)?))
        .await;

    let config_result = runner.run(&Get::config(ConfigRetrieve::All)).await;
    let startup = json_payload(&config_result, &host)["config"]["startup"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let config_file = args.output_dir.join(format!("{}.cfg", host));
    let write_config = runner.run(&WriteFile::new(config_file, startup)).await;

    runner.close().await;
    transient.remove()?;

    for result in [&facts_result, &write_facts, &config_result, &write_config] {
        print_result(result)?;
    }
    for result in [&facts_result, &write_facts, &config_result, &write_config] {
        result.raise_on_error()?;
    }
    Ok(())
}

/// The getter payload for `host` (`{"facts": {...}}`, ...), or null.
fn json_payload(result: &AggregatedResult, host: &str) -> serde_json::Value {
    result
        .get(host)
        .and_then(|multi| multi.result())
        .and_then(|task| task.payload.as_json())
        .cloned()
        .unwrap_or_default()
}

struct Args {
    output_dir: PathBuf,
    workers: usize,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut output_dir = PathBuf::from(".");
        let mut workers = 20usize;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--output-dir" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        output_dir = PathBuf::from(&args[i]);
                    }
                }
                "--workers" | "-w" => {
                    i += 1;
                    if i < args.len() {
                        workers = args[i].parse().unwrap_or(20);
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            output_dir,
            workers,
        }
    }

    fn print_help() {
        println!(
            r#"ferrotask ios_facts example

USAGE:
    cargo run --example ios_facts -- [OPTIONS]

OPTIONS:
    -o, --output-dir <DIR>   Where to write <host>_facts.txt and <host>.cfg [default: .]
    -w, --workers <N>        Hosts worked on at once [default: 20]
    --help                   Print this help message

The router name, address and credentials are asked for interactively.
"#
        );
    }
}
