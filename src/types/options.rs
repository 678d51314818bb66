//! Option types shared by the queue generators and the CLI.

use serde::{Deserialize, Serialize};

/// How the review gate treats packages that have not been reviewed yet.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewType {
    /// Review is skipped entirely.
    Disabled,
    /// Interactive prompt for every unreviewed package (the default).
    #[default]
    Enabled,
    /// Silently mark unreviewed packages as reviewed.
    Auto,
    /// Display the review bundle, then mark as reviewed without prompting.
    AutoVerbose,
}

impl ReviewType {
    /// What: Priority used to resolve conflicting review flags.
    ///
    /// Output:
    /// - Returns a rank where a higher value wins a flag conflict.
    ///
    /// Details:
    /// - Ordering is `Disabled > AutoVerbose > Auto > Enabled`.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Enabled => 0,
            Self::Auto => 1,
            Self::AutoVerbose => 2,
            Self::Disabled => 3,
        }
    }
}

/// Destination format for a generated queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// One package per line, with buildopts, written to an `.sqf` file.
    #[default]
    File,
    /// Space-separated names on stdout.
    Stdout,
    /// Space-separated `REPO:name` entries on stdout.
    Slackpkg1,
    /// Space-separated `name:REPO` entries on stdout.
    Slackpkg2,
}

impl OutputMode {
    /// True for the modes that print a single console line.
    #[must_use]
    pub const fn is_console(self) -> bool {
        !matches!(self, Self::File)
    }
}

/// Installed-package skip policy for queue generation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckInstalled {
    /// Do not consult the installed set.
    #[default]
    None,
    /// Skip dependencies installed with the configured tag.
    Tagged,
    /// Skip dependencies installed with any tag.
    Any,
}

impl CheckInstalled {
    /// True when installed packages should be skipped at all.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }

    /// What: Tag filter to hand to the installed-package oracle.
    ///
    /// Inputs:
    /// - `sbo_tag`: The configured repository tag.
    ///
    /// Output:
    /// - Returns `Some(sbo_tag)` for `Tagged`, `None` for `Any` (accept any
    ///   entry) and for `None` (caller never asks).
    #[must_use]
    pub fn tag_filter(self, sbo_tag: &str) -> Option<&str> {
        match self {
            Self::Tagged => Some(sbo_tag),
            Self::None | Self::Any => None,
        }
    }
}

/// Options steering dep-file loading, traversal, and queue generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgOptions {
    /// Skip policy for already-installed dependencies.
    pub check_installed: CheckInstalled,
    /// Traversal depth limit; −1 means unbounded.
    pub max_dist: i32,
    /// Review gate behavior.
    pub review_type: ReviewType,
    /// Queue destination format.
    pub output_mode: OutputMode,
    /// Explicit output file name (`-o`).
    pub output_name: Option<String>,
    /// Recurse through dep files below the target.
    pub recursive: bool,
    /// Treat `OPTIONAL:` entries as required.
    pub optional: bool,
    /// Restrict reverse-dependency loading to installed packages.
    pub installed_revdeps: bool,
    /// Traverse reverse dependencies instead of dependencies.
    pub revdeps: bool,
    /// Walk the full graph depth.
    pub deep: bool,
    /// Emit same-version dependency rebuilds from the update planner.
    pub rebuild_deps: bool,
}

impl Default for PkgOptions {
    fn default() -> Self {
        Self {
            check_installed: CheckInstalled::None,
            max_dist: -1,
            review_type: ReviewType::default(),
            output_mode: OutputMode::default(),
            output_name: None,
            recursive: true,
            optional: true,
            installed_revdeps: false,
            revdeps: false,
            deep: true,
            rebuild_deps: false,
        }
    }
}
