//! User configuration for sbo-toolkit.
//!
//! Configuration lives in `~/.sbq` as `KEY = VALUE` lines. The `PAGER` and
//! `EDITOR` environment variables override the built-in defaults before the
//! file is read, so an explicit file entry always wins.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SboToolkitError};

/// Name of the configuration file under the user's home directory.
pub const CONFIG_FILE: &str = ".sbq";

/// Catalog file name under the dependency directory.
pub const PKGDB_FILE: &str = "PKGDB";

const DEFAULT_SBOPKG_REPO: &str = "/var/lib/sbopkg/SBo";
const DEFAULT_SLACKPKG_REPO_NAME: &str = "SLACKPKGPLUS_SBo";
const DEFAULT_SBO_TAG: &str = "_SBo";
const DEFAULT_DEPDIR: &str = "/var/lib/sbq";
const DEFAULT_PAGER: &str = "less -r";
const DEFAULT_EDITOR: &str = "vi";

/// Runtime configuration shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserConfig {
    /// Root of the on-disk build-script repository.
    pub sbopkg_repo: PathBuf,
    /// Repository name matched against column 0 of the slackpkg pkglist.
    pub slackpkg_repo_name: String,
    /// Build tag identifying packages built from this repository.
    pub sbo_tag: String,
    /// State directory holding PKGDB and the per-package dep files.
    pub depdir: PathBuf,
    /// Pager command used to display review bundles; empty disables paging.
    pub pager: String,
    /// Editor command used to edit dependency files.
    pub editor: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            sbopkg_repo: PathBuf::from(DEFAULT_SBOPKG_REPO),
            slackpkg_repo_name: DEFAULT_SLACKPKG_REPO_NAME.to_string(),
            sbo_tag: DEFAULT_SBO_TAG.to_string(),
            depdir: PathBuf::from(DEFAULT_DEPDIR),
            pager: DEFAULT_PAGER.to_string(),
            editor: DEFAULT_EDITOR.to_string(),
        }
    }
}

impl UserConfig {
    /// What: Load the configuration for the current user.
    ///
    /// Inputs: None (reads the environment and `~/.sbq`).
    ///
    /// Output:
    /// - Returns the effective `UserConfig`.
    ///
    /// Details:
    /// - Starts from built-in defaults, applies `PAGER`/`EDITOR` from the
    ///   environment, then reads the config file.
    /// - If the file does not exist it is created with the current values.
    ///
    /// # Errors
    ///
    /// Returns `Config` when the home directory cannot be determined or a
    /// config line is malformed, and `Io` when the file cannot be read or
    /// created.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| SboToolkitError::Config("unable to determine home directory".into()))?;
        Self::load_from(&home.join(CONFIG_FILE))
    }

    /// What: Load the configuration from an explicit file path.
    ///
    /// Inputs:
    /// - `path`: Location of the `KEY = VALUE` configuration file.
    ///
    /// Output:
    /// - Returns the effective `UserConfig`.
    ///
    /// Details:
    /// - Environment overrides and file creation behave exactly as in
    ///   [`UserConfig::load`]; this entry point exists for tests.
    ///
    /// # Errors
    ///
    /// Returns `Config` for malformed lines and `Io` for filesystem failures.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Ok(pager) = std::env::var("PAGER")
            && !pager.is_empty()
        {
            config.pager = pager;
        }
        if let Ok(editor) = std::env::var("EDITOR")
            && !editor.is_empty()
        {
            config.editor = editor;
        }

        if path.exists() {
            config.read_file(path)?;
        } else {
            config.write_file(path)?;
        }

        Ok(config)
    }

    /// Path of the persistent package catalog.
    #[must_use]
    pub fn pkgdb_path(&self) -> PathBuf {
        self.depdir.join(PKGDB_FILE)
    }

    /// Path of the dependency file for `pkg_name`.
    #[must_use]
    pub fn dep_file_path(&self, pkg_name: &str) -> PathBuf {
        self.depdir.join(pkg_name)
    }

    /// What: Parse a configuration file into `self`.
    ///
    /// Details:
    /// - Blank lines and lines starting with `#` are skipped.
    /// - Values may be single- or double-quoted; quotes are stripped.
    /// - Unknown keys produce a warning naming the line; a line without `=`
    ///   is a fatal configuration error.
    fn read_file(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path).map_err(|e| SboToolkitError::io(path, e))?;

        for (lineno, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(SboToolkitError::Config(format!(
                    "badly formatted entry at line {} in {}",
                    lineno + 1,
                    path.display()
                )));
            };

            let key = key.trim();
            let value = strip_quotes(value.trim());

            match key {
                "SBOPKG_REPO" => self.sbopkg_repo = PathBuf::from(value),
                "SLACKPKG_REPO_NAME" => self.slackpkg_repo_name = value.to_string(),
                "SBO_TAG" => self.sbo_tag = value.to_string(),
                "DEPDIR" => self.depdir = PathBuf::from(value),
                "PAGER" => self.pager = value.to_string(),
                "EDITOR" => self.editor = value.to_string(),
                _ => {
                    tracing::warn!(
                        "unknown configuration {key}={value} at line {} in {}",
                        lineno + 1,
                        path.display()
                    );
                }
            }
        }

        Ok(())
    }

    /// Write the current values out as a fresh configuration file.
    fn write_file(&self, path: &Path) -> Result<()> {
        let contents = format!(
            "# Default sbq configuration\n\
             SBOPKG_REPO = {}\n\
             SLACKPKG_REPO_NAME = {}\n\
             SBO_TAG = {}\n\
             DEPDIR = {}\n\
             PAGER = {}\n\
             EDITOR = {}\n",
            self.sbopkg_repo.display(),
            self.slackpkg_repo_name,
            self.sbo_tag,
            self.depdir.display(),
            self.pager,
            self.editor,
        );
        fs::write(path, contents).map_err(|e| SboToolkitError::io(path, e))
    }
}

/// Strip one layer of matching single or double quotes from a value.
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        return value[1..value.len() - 1].trim();
    }
    value
}
