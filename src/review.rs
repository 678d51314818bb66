//! Review protocol for package definitions and dependency files.
//!
//! Before a package's name is committed to any queue, the review gate checks
//! its `is_reviewed` flag. Depending on the review type it silently approves,
//! displays the package's `.info`/`README`/dep-file bundle, or prompts the
//! user. The prompt can revert the dep file to its synthesized default or
//! hand it to the editor; either change aborts the enclosing traversal so
//! the caller reloads the file and retries.

use std::fs;
use std::io::{BufRead, Write};
use std::process::{Command, Stdio};

use crate::config::UserConfig;
use crate::error::{Result, SboToolkitError};
use crate::graph::{self, PackageGraph};
use crate::types::{Package, PkgOptions, ReviewType};
use crate::{mesg, pkgdb, repo};

const BORDER1: &str =
    "================================================================================";
const BORDER2: &str =
    "::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::::";

/// Dep-file modifications recorded during a review prompt.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DepChanges {
    /// The dep file was overwritten with its synthesized default.
    pub reverted: bool,
    /// The dep file was opened in the editor.
    pub edited: bool,
}

impl DepChanges {
    /// True when any modification was recorded.
    #[must_use]
    pub const fn any(self) -> bool {
        self.reverted || self.edited
    }

    /// True when this set of changes overlaps `mask`.
    #[must_use]
    pub const fn intersects(self, mask: Self) -> bool {
        (self.reverted && mask.reverted) || (self.edited && mask.edited)
    }

    /// Mask matching every modification.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            reverted: true,
            edited: true,
        }
    }
}

/// Outcome of the review gate for one package.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReviewStatus {
    /// The package may be emitted; it is (now) reviewed.
    Accepted,
    /// The user declined to mark it reviewed; emit it anyway.
    Rejected,
    /// The dep file changed; the caller must reload it and restart the
    /// current traversal.
    Restart,
}

/// What: Run a closure with SIGINT and SIGQUIT ignored.
///
/// Details:
/// - Keyboard interrupts during the pager or editor child must reach only
///   the child; the previous handlers are restored afterwards.
fn with_signals_ignored<T>(f: impl FnOnce() -> T) -> T {
    unsafe {
        let old_int = libc::signal(libc::SIGINT, libc::SIG_IGN);
        let old_quit = libc::signal(libc::SIGQUIT, libc::SIG_IGN);
        let result = f();
        libc::signal(libc::SIGINT, old_int);
        libc::signal(libc::SIGQUIT, old_quit);
        result
    }
}

/// What: Display a text block through the configured pager.
///
/// Details:
/// - An empty pager setting, or a pager that fails to spawn, falls back to
///   plain stdout. A pager quit before the end of input is not an error.
fn page_text(text: &str, config: &UserConfig) {
    let pager = config.pager.trim();
    if pager.is_empty() {
        print!("{text}");
        return;
    }

    with_signals_ignored(|| {
        let child = Command::new("sh")
            .arg("-c")
            .arg(pager)
            .stdin(Stdio::piped())
            .spawn();

        match child {
            Ok(mut child) => {
                if let Some(mut stdin) = child.stdin.take() {
                    // The user may quit the pager early; ignore the pipe error
                    let _ = stdin.write_all(text.as_bytes());
                }
                let _ = child.wait();
            }
            Err(e) => {
                tracing::warn!("unable to spawn pager {pager}: {e}");
                print!("{text}");
            }
        }
    });
}

/// What: Build the banner-delimited review bundle for a package.
///
/// Inputs:
/// - `pkg`: Repository package (needs a build directory).
/// - `config`: Supplies the state directory.
/// - `include_dep`: Append the dependency-file section.
///
/// Output:
/// - Returns the rendered text.
///
/// Details:
/// - A missing dep file is synthesized first so the user reviews what the
///   loader would actually parse.
///
/// # Errors
///
/// Returns `PackageNotFound` for meta-packages and `Io` when the `.info`
/// file cannot be read.
fn render_bundle(pkg: &Package, config: &UserConfig, include_dep: bool) -> Result<String> {
    let Some(sbo_dir) = &pkg.sbo_dir else {
        return Err(SboToolkitError::PackageNotFound(pkg.name.clone()));
    };

    let info_path = sbo_dir.join(format!("{}.info", pkg.name));
    let info = fs::read_to_string(&info_path).map_err(|e| SboToolkitError::io(&info_path, e))?;
    let readme = repo::load_readme(sbo_dir);

    let mut text = format!("{BORDER1}\n{}\n{BORDER1}\n\n{info}\n", pkg.name);
    text.push_str(&format!("{BORDER2}\nREADME\n{BORDER2}\n{readme}\n\n"));

    if include_dep {
        text.push_str(&format!("{BORDER2}\nDependency File\n{BORDER2}\n"));

        let dep_path = config.dep_file_path(&pkg.name);
        if !dep_path.is_file() {
            graph::create_default_dep_verbose(pkg, config)?;
        }
        match fs::read_to_string(&dep_path) {
            Ok(dep) => text.push_str(&format!("{dep}\n\n")),
            Err(_) => text.push_str(&format!("{} dependency file not found\n\n", pkg.name)),
        }
    }

    Ok(text)
}

/// What: Display a package's full review bundle (with its dep file).
///
/// # Errors
///
/// See [`render_bundle`].
pub fn pkg_review(pkg: &Package, config: &UserConfig) -> Result<()> {
    let text = render_bundle(pkg, config, true)?;
    page_text(&text, config);
    Ok(())
}

/// What: Display a package's `.info` and `README` only.
///
/// # Errors
///
/// See [`render_bundle`].
pub fn pkg_show_info(pkg: &Package, config: &UserConfig) -> Result<()> {
    let text = render_bundle(pkg, config, false)?;
    page_text(&text, config);
    Ok(())
}

/// What: Spawn the configured editor on a package's dep file.
///
/// Inputs:
/// - `pkg_name`: Package whose dep file is edited.
/// - `config`: Supplies the editor command and state directory.
///
/// Details:
/// - The editor setting is whitespace-tokenized into command and arguments;
///   the dep file path is appended. SIGINT/SIGQUIT are ignored while the
///   child runs.
///
/// # Errors
///
/// Returns `MissingDepFile` when there is nothing to edit, `Config` for an
/// empty editor setting, and `Io` when the editor cannot be spawned or
/// exits unsuccessfully.
pub fn edit_dep_file(pkg_name: &str, config: &UserConfig) -> Result<()> {
    let dep_path = config.dep_file_path(pkg_name);
    if !dep_path.is_file() {
        return Err(SboToolkitError::MissingDepFile(pkg_name.to_string()));
    }

    let mut parts = config.editor.split_whitespace();
    let editor = parts
        .next()
        .ok_or_else(|| SboToolkitError::Config("EDITOR is empty".into()))?;
    let args: Vec<&str> = parts.collect();

    let status = with_signals_ignored(|| {
        Command::new(editor)
            .args(&args)
            .arg(&dep_path)
            .status()
            .map_err(|e| SboToolkitError::io(&dep_path, e))
    })?;

    if !status.success() {
        return Err(SboToolkitError::io(
            &dep_path,
            std::io::Error::other(format!("editor exited with {status}")),
        ));
    }
    Ok(())
}

/// Read one response character from stdin; `None` for invalid input.
fn read_response() -> Option<char> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;

    let line = line.strip_suffix('\n')?;
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (c, None) => Some(c.unwrap_or('\n')),
        _ => None,
    }
}

/// What: Interactively review a package and prompt for a decision.
///
/// Inputs:
/// - `pkg`: The package under review.
/// - `config`: Supplies pager, editor, and state directory.
/// - `restart_mask`: Dep-file changes that end the prompt immediately;
///   changes outside the mask re-display and re-prompt in place.
///
/// Output:
/// - Returns whether the user approved the review, together with every
///   dep-file change recorded along the way.
///
/// Details:
/// - Responses: `[Y]es` approve, `[n]o` decline, `[d]efault` revert the dep
///   file, `[e]dit` open the editor, `[a]gain` re-display, `[q]uit`
///   terminate.
///
/// # Errors
///
/// Returns `UserCancel` for `q`, plus any display/editor failure.
pub fn review_prompt(
    pkg: &Package,
    config: &UserConfig,
    restart_mask: DepChanges,
) -> Result<(bool, DepChanges)> {
    let mut changes = DepChanges::default();

    loop {
        pkg_review(pkg, config)?;

        loop {
            print!(
                "Add {} to REVIEWED ([Y]es / [n]o / [d]efault / [e]dit / [a]gain / [q]uit)? ",
                pkg.name
            );
            let _ = std::io::stdout().flush();

            let Some(response) = read_response() else {
                continue;
            };

            match response {
                'y' | 'Y' | '\n' => return Ok((true, changes)),
                'n' | 'N' => return Ok((false, changes)),
                'd' | 'D' => {
                    graph::create_default_dep(pkg, config)?;
                    changes.reverted = true;
                    if changes.intersects(restart_mask) {
                        return Ok((false, changes));
                    }
                    break;
                }
                'e' | 'E' => {
                    edit_dep_file(&pkg.name, config)?;
                    changes.edited = true;
                    if changes.intersects(restart_mask) {
                        return Ok((false, changes));
                    }
                    break;
                }
                'a' | 'A' => break,
                'q' | 'Q' => {
                    mesg::error("terminating upon user request");
                    return Err(SboToolkitError::UserCancel);
                }
                _ => {}
            }
        }
    }
}

/// What: Gate one package on its review state.
///
/// Inputs:
/// - `pkg`: The package about to be emitted; its `is_reviewed` flag may be
///   set here.
/// - `review_type`: Gate behavior.
/// - `config`: Supplies pager, editor, and state directory.
/// - `db_dirty`: Set when the review flag changed and PKGDB needs a
///   rewrite.
///
/// Output:
/// - Returns the three-way [`ReviewStatus`]; on `Restart` the caller must
///   clear the package's edges, reload its dep file, and retry the current
///   traversal.
///
/// # Errors
///
/// Returns `UserCancel` when the user quits, plus any display/editor
/// failure.
pub fn check_reviewed(
    pkg: &mut Package,
    review_type: ReviewType,
    config: &UserConfig,
    db_dirty: &mut bool,
) -> Result<ReviewStatus> {
    if review_type == ReviewType::Disabled || pkg.is_reviewed {
        return Ok(ReviewStatus::Accepted);
    }

    let (approved, changes) = match review_type {
        ReviewType::Auto => (true, DepChanges::default()),
        ReviewType::AutoVerbose => {
            pkg_review(pkg, config)?;
            (true, DepChanges::default())
        }
        ReviewType::Enabled => review_prompt(pkg, config, DepChanges::all())?,
        ReviewType::Disabled => unreachable!("handled above"),
    };

    if approved {
        pkg.is_reviewed = true;
        *db_dirty = true;
    }

    if changes.any() {
        return Ok(ReviewStatus::Restart);
    }
    Ok(if approved {
        ReviewStatus::Accepted
    } else {
        ReviewStatus::Rejected
    })
}

/// What: Run the `review` command for one package.
///
/// Details:
/// - Ensures the dep file exists (non-recursive load), displays the bundle,
///   and prompts when the package is not yet reviewed; an approval is
///   persisted to PKGDB immediately.
///
/// Output:
/// - Returns `true` when the package is (or became) reviewed.
///
/// # Errors
///
/// Propagates load, display, and persistence failures, and `UserCancel`.
pub fn run_review(graph: &mut PackageGraph, pkg_name: &str, config: &UserConfig) -> Result<bool> {
    let options = PkgOptions {
        recursive: false,
        ..PkgOptions::default()
    };
    graph::load_dep(graph, pkg_name, &options, config)?;

    let id = graph
        .lookup(pkg_name)
        .ok_or_else(|| SboToolkitError::PackageNotFound(pkg_name.to_string()))?;

    if graph.node(id).is_reviewed {
        pkg_review(graph.node(id), config)?;
        return Ok(true);
    }

    let (approved, _changes) = review_prompt(graph.node(id), config, DepChanges::default())?;
    if approved {
        graph.node_mut(id).is_reviewed = true;
        pkgdb::write_pkgdb(graph, config)?;
    }
    Ok(approved)
}

/// What: Run the `info` command for one package.
///
/// # Errors
///
/// Returns `PackageNotFound` for unknown names and display failures
/// otherwise.
pub fn run_info(graph: &mut PackageGraph, pkg_name: &str, config: &UserConfig) -> Result<()> {
    let id = graph::resolve_node(graph, pkg_name, config)
        .ok_or_else(|| SboToolkitError::PackageNotFound(pkg_name.to_string()))?;
    pkg_show_info(graph.node(id), config)
}

/// What: Run the `edit` command for one package.
///
/// Details:
/// - Spawns the editor on the dep file; a successful edit clears the
///   package's review flag and rewrites PKGDB.
///
/// # Errors
///
/// Propagates editor and persistence failures.
pub fn run_edit(graph: &mut PackageGraph, pkg_name: &str, config: &UserConfig) -> Result<()> {
    let id = graph::resolve_node(graph, pkg_name, config)
        .ok_or_else(|| SboToolkitError::PackageNotFound(pkg_name.to_string()))?;

    edit_dep_file(graph.name(id), config)?;

    graph.node_mut(id).is_reviewed = false;
    pkgdb::write_pkgdb(graph, config)
}
