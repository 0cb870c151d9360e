//! Verify one command against a console socket.
//!
//! Connects to a sandbox debug console, sends a command, and reports whether
//! a response line contains the expected text.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example verify_console -- \
//!     --socket /run/vc/vm/foobar/console.sock --command "ls /" --expect etc
//! ```
//!
//! Exits with status 1 if the check fails.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use consolecheck::{Endpoint, VerifierBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=trace to see every received line)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let builder = match &args.endpoint {
        Endpoint::Unix(path) => VerifierBuilder::unix(path),
        Endpoint::Tcp { host, port } => VerifierBuilder::tcp(host, *port),
    };
    let verifier = builder
        .response_timeout(Duration::from_secs(args.timeout))
        .lines_to_skip(args.skip)
        .build()?;

    println!("Console: {}", args.endpoint);
    println!("Command: {}", args.command);
    println!("{}", "-".repeat(50));

    // Commands are sent as given, so add the terminator here.
    let command = format!("{}\n", args.command.trim_end_matches('\n'));
    let verdict = verifier.verify(&command, &args.expect).await;

    println!("{}", verdict);
    println!("States:  {:?}", verdict.states);
    println!("Elapsed: {:?}", verdict.elapsed);

    if !verdict.passed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    endpoint: Endpoint,
    command: String,
    expect: String,
    timeout: u64,
    skip: usize,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut endpoint = Endpoint::Unix(PathBuf::from("/run/vc/vm/foobar/console.sock"));
        let mut command = "ls /".to_string();
        let mut expect = "etc".to_string();
        let mut timeout = 10u64;
        let mut skip = 2usize;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--socket" | "-s" => {
                    i += 1;
                    if i < args.len() {
                        endpoint = Endpoint::Unix(PathBuf::from(&args[i]));
                    }
                }
                "--tcp" => {
                    i += 1;
                    if i < args.len() {
                        match args[i].rsplit_once(':') {
                            Some((host, port)) => {
                                endpoint = Endpoint::Tcp {
                                    host: host.to_string(),
                                    port: port.parse().unwrap_or(1026),
                                }
                            }
                            None => eprintln!("Expected HOST:PORT, got {}", args[i]),
                        }
                    }
                }
                "--command" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        command = args[i].clone();
                    }
                }
                "--expect" | "-e" => {
                    i += 1;
                    if i < args.len() {
                        expect = args[i].clone();
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(10);
                    }
                }
                "--skip" => {
                    i += 1;
                    if i < args.len() {
                        skip = args[i].parse().unwrap_or(2);
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
            endpoint,
            command,
            expect,
            timeout,
            skip,
        }
    }

    fn print_help() {
        println!(
            r#"consolecheck verify_console example

USAGE:
    cargo run --example verify_console -- [OPTIONS]

OPTIONS:
    -s, --socket <PATH>      Console Unix socket [default: /run/vc/vm/foobar/console.sock]
        --tcp <HOST:PORT>    Console TCP address instead of a socket
    -c, --command <CMD>      Command to send [default: ls /]
    -e, --expect <TEXT>      Substring expected in a response line [default: etc]
    -t, --timeout <SECS>     Response timeout [default: 10]
        --skip <N>           Leading lines to ignore [default: 2]
    --help                   Print this help message
"#
        );
    }
}
