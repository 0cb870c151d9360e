//! INI-style config edits through an external editor.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use super::backup::ConfigBackup;
use super::{ConfigMutation, ProcessRunner};
use crate::error::Result;

/// One `section.key = value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSetting {
    pub section: String,
    pub key: String,
    pub value: String,
}

/// Sets keys in an INI/TOML-like file with `crudini --set`.
///
/// The file is backed up before the first edit; reverting restores the
/// backup, so every setting is undone at once. If an edit fails, the backup
/// is restored before `apply` returns.
pub struct IniEdit {
    name: String,
    file: PathBuf,
    editor: String,
    settings: Vec<IniSetting>,
    backup: ConfigBackup,
    runner: Arc<dyn ProcessRunner>,
}

impl IniEdit {
    /// Create an edit of `file` with no settings yet.
    pub fn new(file: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>) -> Self {
        let file = file.into();
        Self {
            name: format!("edit {}", file.display()),
            backup: ConfigBackup::new(&file),
            file,
            editor: "crudini".to_string(),
            settings: Vec::new(),
            runner,
        }
    }

    /// Add a setting.
    pub fn set(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.settings.push(IniSetting {
            section: section.into(),
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Use a different editor program (default: `crudini`).
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    /// Settings applied by this edit, in order.
    pub fn settings(&self) -> &[IniSetting] {
        &self.settings
    }

    /// The backup protecting the file.
    pub fn backup(&self) -> &ConfigBackup {
        &self.backup
    }

    fn editor_args(&self, setting: &IniSetting) -> Vec<String> {
        vec![
            "--set".to_string(),
            self.file.display().to_string(),
            setting.section.clone(),
            setting.key.clone(),
            setting.value.clone(),
        ]
    }
}

#[async_trait]
impl ConfigMutation for IniEdit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self) -> Result<()> {
        self.backup.save().await?;
        for setting in &self.settings {
            debug!(
                "setting [{}] {} = {}",
                setting.section, setting.key, setting.value
            );
            if let Err(e) = self.runner.run(&self.editor, &self.editor_args(setting)).await {
                // Earlier settings may already be written.
                if let Err(restore) = self.backup.restore().await {
                    warn!("restoring {} failed: {}", self.file.display(), restore);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    async fn revert(&self) -> Result<()> {
        self.backup.restore().await
    }
}
