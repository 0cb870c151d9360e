//! Temporary host directory shared into the sandbox.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::error::{HarnessError, Result};

/// A temporary directory holding one mount directory with one file.
///
/// Layout: `<tmp>/<mount_name>/<file_name>`. The whole tree is removed when
/// the fixture is closed or dropped.
#[derive(Debug)]
pub struct MountFixture {
    root: TempDir,
    mount_dir: PathBuf,
    file: PathBuf,
}

impl MountFixture {
    /// Create the fixture with `contents` written to the file.
    pub fn create(mount_name: &str, file_name: &str, contents: &[u8]) -> Result<Self> {
        let root = tempfile::tempdir().map_err(HarnessError::Fixture)?;
        let mount_dir = root.path().join(mount_name);
        let file = mount_dir.join(file_name);

        fs::create_dir(&mount_dir).map_err(HarnessError::Fixture)?;
        fs::write(&file, contents).map_err(HarnessError::Fixture)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&mount_dir, fs::Permissions::from_mode(0o750))
                .map_err(HarnessError::Fixture)?;
            fs::set_permissions(&file, fs::Permissions::from_mode(0o644))
                .map_err(HarnessError::Fixture)?;
        }

        debug!("created mount fixture at {}", mount_dir.display());
        Ok(Self {
            root,
            mount_dir,
            file,
        })
    }

    /// The temporary root directory.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// The directory meant to be mounted.
    pub fn mount_dir(&self) -> &Path {
        &self.mount_dir
    }

    /// The file inside the mount directory.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Remove the fixture, reporting errors instead of ignoring them.
    pub fn close(self) -> Result<()> {
        self.root.close().map_err(HarnessError::Fixture)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_and_contents() {
        let fixture = MountFixture::create("test-mount", "test-file", b"hello hello!").unwrap();

        assert!(fixture.mount_dir().is_dir());
        assert_eq!(fixture.mount_dir().parent(), Some(fixture.root()));
        assert_eq!(fs::read(fixture.file()).unwrap(), b"hello hello!");
    }

    #[test]
    fn test_close_removes_tree() {
        let fixture = MountFixture::create("test-mount", "test-file", b"x").unwrap();
        let root = fixture.root().to_path_buf();
        fixture.close().unwrap();
        assert!(!root.exists());
    }
}
