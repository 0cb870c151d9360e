//! Sandbox bind-mount scenario for Kata Containers.
//!
//! Shares a host directory into the sandbox with `sandbox_bind_mounts`,
//! enables the agent debug console, starts a busybox container, and checks
//! over the console that the mount is visible, read-only, and readable.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::harness::{
    CheckSuite, Container, ContainerSpec, IniEdit, MountFixture, ProcessRunner, Scenario,
};
use crate::transport::ConsoleTarget;
use crate::verify::{Check, VerifierConfig};

/// Where sandbox bind mounts appear inside the guest.
pub const GUEST_MOUNT_ROOT: &str = "/run/kata-containers/shared/containers/sandbox-mounts";

/// Name of the shared directory.
pub const MOUNT_NAME: &str = "test-mount";

/// Name of the file inside the shared directory.
pub const FILE_NAME: &str = "test-file";

/// Contents written to the shared file.
pub const FILE_CONTENTS: &[u8] = b"hello hello!";

/// Host-side settings for the scenario.
#[derive(Debug, Clone)]
pub struct Options {
    /// Runtime configuration file to edit.
    pub config_path: PathBuf,

    /// Container (and sandbox) id.
    pub container_id: String,

    /// Image to run.
    pub image: String,

    /// containerd runtime handler.
    pub runtime: String,

    /// Directory holding per-sandbox console sockets.
    pub vm_state_dir: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/usr/share/kata-containers/configuration.toml"),
            container_id: "foobar".to_string(),
            image: "docker.io/library/busybox:latest".to_string(),
            runtime: "io.containerd.kata.v2".to_string(),
            vm_state_dir: PathBuf::from("/var/run/vc/vm"),
        }
    }
}

impl Options {
    /// Console socket of the sandbox started by the scenario.
    pub fn console_socket(&self) -> PathBuf {
        self.vm_state_dir
            .join(&self.container_id)
            .join("console.sock")
    }

    /// Verifier settings for the sandbox console.
    pub fn verifier_config(&self) -> VerifierConfig {
        let target = ConsoleTarget::unix(self.console_socket())
            .with_connect_timeout(Duration::from_secs(10));
        let mut config = VerifierConfig::new(target);
        config.response_timeout = Duration::from_secs(10);
        config
    }
}

/// The three console checks against the shared mount.
pub fn checks() -> CheckSuite {
    let dir = format!("{}/{}", GUEST_MOUNT_ROOT, MOUNT_NAME);
    let file = format!("{}/{}", dir, FILE_NAME);

    CheckSuite::new()
        .with_check(Check::new("mount-visible", format!("ls {}/\n", dir), FILE_NAME))
        .with_check(Check::new(
            "mount-read-only",
            format!("echo 'should fail' >> {}\n", file),
            "Read-only",
        ))
        .with_check(Check::new(
            "file-readable",
            format!("cat {} | grep hello\n", file),
            "hello",
        ))
}

/// `sandbox_bind_mounts` value sharing the fixture's directory and file.
pub fn bind_mounts_value(fixture: &MountFixture) -> String {
    format!(
        "['{}', '{}']",
        fixture.mount_dir().display(),
        fixture.file().display()
    )
}

/// Build the full scenario: fixture, config edits, container and checks.
pub fn scenario(options: &Options, runner: Arc<dyn ProcessRunner>) -> Result<Scenario> {
    let fixture = MountFixture::create(MOUNT_NAME, FILE_NAME, FILE_CONTENTS)?;

    let edit = IniEdit::new(&options.config_path, runner.clone())
        .set("hypervisor.qemu", "kernel_params", "\"agent.debug_console\"")
        .set("runtime", "sandbox_bind_mounts", bind_mounts_value(&fixture));

    let container = Container::new(
        ContainerSpec::new(&options.container_id, &options.image, &options.runtime),
        runner,
    );

    Ok(Scenario::new("sandbox-bind-mounts")
        .with_fixture(fixture)
        .with_mutation(Box::new(edit))
        .with_container(container)
        .with_suite(checks()))
}
