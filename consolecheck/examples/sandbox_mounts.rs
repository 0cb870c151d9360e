//! Run the sandbox bind-mount scenario end to end.
//!
//! Edits the Kata runtime configuration, starts a busybox container with
//! `ctr`, checks the shared mount over the debug console, and restores
//! everything afterwards.
//!
//! # Prerequisites
//!
//! - containerd with the Kata runtime installed
//! - `crudini` and `ctr` on `PATH`
//! - Root privileges
//!
//! # Usage
//!
//! ```bash
//! sudo -E cargo run --example sandbox_mounts
//! ```

use std::sync::Arc;
use std::time::Duration;

use consolecheck::ConsoleVerifier;
use consolecheck::harness::SystemRunner;
use consolecheck::harness::presets::sandbox_mounts::{self, Options};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::default();
    let runner = Arc::new(SystemRunner::new().with_timeout(Duration::from_secs(120)));
    let verifier = ConsoleVerifier::new(options.verifier_config())?;

    let scenario = sandbox_mounts::scenario(&options, runner)?;
    println!("Running scenario '{}'...", scenario.name());

    let report = scenario.run(&verifier).await?;
    print!("{}", report);

    if !report.passed() {
        std::process::exit(1);
    }
    println!("All checks passed");
    Ok(())
}
