//! Configure an interface address on a Cisco IOS router.
//!
//! Prompts for the router's name and credentials, renders
//! `configure_interface.j2` with the interface settings, pushes the result
//! in configuration mode and saves with `write memory`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example configure_interface
//! cargo run --example configure_interface -- --interface GigabitEthernet0/2 \
//!     --ip 10.1.1.1 --netmask 255.255.255.0
//! ```

use std::env;
use std::path::PathBuf;

use ferrotask::prompt::prompt_device;
use ferrotask::result::print_result;
use ferrotask::task::{Runner, SaveConfig, SendConfig, TemplateFile};
use ferrotask::transient::TransientInventory;
use ferrotask::Inventory;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug for session traces
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let device = prompt_device().await?;
    let host = device.name().to_string();
    let transient = TransientInventory::write(&Inventory::new().with_device(device))?;
    let mut runner = Runner::new(transient.load()?);

    let payload = json!({
        "intf_id": args.interface,
        "ip_addr": args.ip,
        "netmask": args.netmask,
    });
    let template = TemplateFile::new(&args.templates, "configure_interface.j2")
        .with_vars(json!({ "conf": payload }));
    let rendered = runner.run(&template).await;
    rendered.raise_on_error()?;

    let config = rendered
        .get(&host)
        .and_then(|multi| multi.result())
        .and_then(|task| task.payload.as_text())
        .unwrap_or_default()
        .to_string();

    let config_response = runner
        .run(&SendConfig::from_text(&config).with_name("configure router"))
        .await;
    let save_response = runner
        .run(
            &SaveConfig::new()
                .with_name("saving configuration")
                .with_command("write memory"),
        )
        .await;

    print_result(&config_response)?;
    print_result(&save_response)?;

    runner.close().await;
    transient.remove()?;

    config_response.raise_on_error()?;
    save_response.raise_on_error()?;
    Ok(())
}

struct Args {
    templates: PathBuf,
    interface: String,
    ip: String,
    netmask: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut templates = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
        let mut interface = "GigabitEthernet0/1".to_string();
        let mut ip = "192.168.2.1".to_string();
        let mut netmask = "255.255.255.252".to_string();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--templates" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        templates = PathBuf::from(&args[i]);
                    }
                }
                "--interface" | "-i" => {
                    i += 1;
                    if i < args.len() {
                        interface = args[i].clone();
                    }
                }
                "--ip" => {
                    i += 1;
                    if i < args.len() {
                        ip = args[i].clone();
                    }
                }
                "--netmask" | "-m" => {
                    i += 1;
                    if i < args.len() {
                        netmask = args[i].clone();
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
            templates,
            interface,
            ip,
            netmask,
        }
    }

    fn print_help() {
        println!(
            r#"ferrotask configure_interface example

USAGE:
    cargo run --example configure_interface -- [OPTIONS]

OPTIONS:
    -t, --templates <DIR>      Directory holding configure_interface.j2 [default: ./templates]
    -i, --interface <NAME>     Interface to configure [default: GigabitEthernet0/1]
    --ip <ADDR>                Interface address [default: 192.168.2.1]
    -m, --netmask <MASK>       Interface netmask [default: 255.255.255.252]
    --help                     Print this help message

The router name, address and credentials are asked for interactively.
"#
        );
    }
}
