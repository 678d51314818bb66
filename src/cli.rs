//! Command-line surface of the `sbq` binary.
//!
//! Thin layer over the library: parses the subcommands and flags, resolves
//! conflicting review flags by priority, bootstraps the catalog on first
//! run, picks the installed-package oracle, and dispatches.

use clap::{Args, Parser, Subcommand};

use crate::config::UserConfig;
use crate::error::{Result, SboToolkitError};
use crate::graph::PackageGraph;
use crate::installed::{PackageDatabase, PackagesBackend, SlackpkgRepoBackend};
use crate::types::{CheckInstalled, OutputMode, PkgOptions, ReviewType};
use crate::{mesg, pkgdb, queue, repo, review, search};

/// Dependency-graph and build-queue tool for SlackBuilds-style repositories.
#[derive(Parser, Debug)]
#[command(name = "sbq", version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Review-gate flags shared by queue-generating commands.
#[derive(Args, Debug, Default)]
struct ReviewFlags {
    /// Mark unreviewed packages as reviewed without prompting
    #[arg(short = 'a', long = "auto-review")]
    auto_review: bool,

    /// Display each unreviewed package, then mark it reviewed
    #[arg(short = 'A', long = "auto-review-verbose")]
    auto_review_verbose: bool,

    /// Skip the review gate entirely
    #[arg(short = 'i', long = "ignore-review")]
    ignore_review: bool,
}

/// Output-destination flags shared by queue-generating commands.
#[derive(Args, Debug, Default)]
struct OutputFlags {
    /// Print the queue as a single line on stdout
    #[arg(
        short = 'l',
        long = "list",
        conflicts_with_all = ["list_slackpkg", "output"]
    )]
    list: bool,

    /// Print slackpkg-ready names (1 = REPO:name, 2 = name:REPO)
    #[arg(
        short = 'L',
        long = "list-slackpkg",
        value_name = "MODE",
        conflicts_with = "output"
    )]
    list_slackpkg: Option<u8>,

    /// Write the queue to FILE instead of the default name
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a build queue for one or more packages
    Build {
        #[command(flatten)]
        review: ReviewFlags,

        #[command(flatten)]
        out: OutputFlags,

        /// Skip dependencies installed with the configured tag
        #[arg(short = 'c', long = "check-installed")]
        check_installed: bool,

        /// Skip dependencies installed with any tag
        #[arg(short = 'C', long = "check-any-installed")]
        check_any_installed: bool,

        /// Walk the full dependency depth
        #[arg(short = 'd', long = "deep")]
        deep: bool,

        /// Do not recurse through dependency files
        #[arg(short = 'n', long = "no-recursive")]
        no_recursive: bool,

        /// Traverse reverse dependencies instead of dependencies
        #[arg(short = 'p', long = "revdeps")]
        revdeps: bool,

        /// Reverse dependencies, restricted to installed chains
        #[arg(short = 'P', long = "installed-revdeps")]
        installed_revdeps: bool,

        /// Consult the slackpkg repository instead of the package database
        #[arg(short = 'R', long = "repo-db")]
        repo_db: bool,

        /// Packages to queue
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Create a removal queue for one or more packages
    Remove {
        #[command(flatten)]
        out: OutputFlags,

        /// Cascade through the full dependency depth
        #[arg(short = 'd', long = "deep")]
        deep: bool,

        /// Consult the slackpkg repository instead of the package database
        #[arg(short = 'R', long = "repo-db")]
        repo_db: bool,

        /// Packages to remove
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Plan and queue updates for one or more packages
    Update {
        #[command(flatten)]
        review: ReviewFlags,

        #[command(flatten)]
        out: OutputFlags,

        /// Reverse dependencies, restricted to installed chains
        #[arg(short = 'P', long = "installed-revdeps")]
        installed_revdeps: bool,

        /// Also rebuild dependencies whose version is unchanged
        #[arg(short = 'r', long = "rebuild-deps")]
        rebuild_deps: bool,

        /// Consult the slackpkg repository instead of the package database
        #[arg(short = 'R', long = "repo-db")]
        repo_db: bool,

        /// Packages to update
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Synchronize the package catalog with the repository
    Updatedb,

    /// Report packages with pending updates
    #[command(name = "check-updates")]
    CheckUpdates {
        /// Consult the slackpkg repository instead of the package database
        #[arg(short = 'R', long = "repo-db")]
        repo_db: bool,

        /// Restrict the report to one package
        package: Option<String>,
    },

    /// Review a package's definition and dependency file
    Review {
        /// Package to review
        package: String,
    },

    /// Show a package's .info and README
    Info {
        /// Package to show
        package: String,
    },

    /// Edit a package's dependency file
    Edit {
        /// Package whose dependency file to edit
        package: String,
    },

    /// Search package and meta-package names
    Search {
        /// Case-insensitive substring to search for
        pattern: String,
    },

    /// Create a meta-package from a set of packages
    #[command(name = "make-meta")]
    MakeMeta {
        /// Name of the meta-package to create
        #[arg(short = 'o', long = "output", value_name = "METAPKG", required = true)]
        output: String,

        /// Member packages
        #[arg(required = true)]
        packages: Vec<String>,
    },
}

/// What: Resolve possibly conflicting review flags by priority.
///
/// Details:
/// - Priority order is `--ignore-review` > `--auto-review-verbose` >
///   `--auto-review` > the interactive default; when two flags were given
///   the winner is used and a warning names both.
fn resolve_review_type(flags: &ReviewFlags) -> ReviewType {
    let mut given: Vec<(ReviewType, &str)> = Vec::new();
    if flags.ignore_review {
        given.push((ReviewType::Disabled, "--ignore-review/-i"));
    }
    if flags.auto_review_verbose {
        given.push((ReviewType::AutoVerbose, "--auto-review-verbose/-A"));
    }
    if flags.auto_review {
        given.push((ReviewType::Auto, "--auto-review/-a"));
    }

    let Some(&(winner, winner_name)) = given
        .iter()
        .max_by_key(|(review_type, _)| review_type.priority())
    else {
        return ReviewType::Enabled;
    };

    for &(_, loser_name) in given
        .iter()
        .filter(|&&(review_type, _)| review_type != winner)
    {
        mesg::warn(&format!(
            "option {loser_name} conflicts with {winner_name}: using {winner_name}"
        ));
    }

    winner
}

/// Translate the output flags into mode and file name.
fn resolve_output(flags: &OutputFlags) -> Result<(OutputMode, Option<String>)> {
    if flags.list {
        return Ok((OutputMode::Stdout, None));
    }
    match flags.list_slackpkg {
        Some(1) => Ok((OutputMode::Slackpkg1, None)),
        Some(2) => Ok((OutputMode::Slackpkg2, None)),
        Some(_) => Err(SboToolkitError::Config(
            "option --list-slackpkg/-L requires a value of 1 or 2".into(),
        )),
        None => Ok((OutputMode::File, flags.output.clone())),
    }
}

/// Open the selected installed-package oracle.
fn open_oracle(repo_db: bool, config: &UserConfig) -> Result<Box<dyn PackageDatabase>> {
    if repo_db {
        Ok(Box::new(SlackpkgRepoBackend::open_default(
            &config.slackpkg_repo_name,
        )?))
    } else {
        Ok(Box::new(PackagesBackend::open_default()?))
    }
}

/// What: Load the catalog, scanning the repository on first run.
///
/// Details:
/// - Without a PKGDB the repository is scanned, the catalog persisted, and
///   default dep files synthesized for every package.
fn init_graph(config: &UserConfig) -> Result<PackageGraph> {
    if pkgdb::pkgdb_exists(config) {
        return Ok(PackageGraph::from_packages(pkgdb::load_pkgdb(config)?));
    }

    std::fs::create_dir_all(&config.depdir)
        .map_err(|e| SboToolkitError::io(&config.depdir, e))?;

    let graph = PackageGraph::from_packages(repo::scan_repo(&config.sbopkg_repo)?);
    pkgdb::write_pkgdb(&graph, config)?;
    queue::create_default_deps(&graph, config);
    Ok(graph)
}

/// Require a dep file on disk for every named target.
fn require_dep_files(pkg_names: &[String], config: &UserConfig) -> Result<()> {
    for name in pkg_names {
        if !config.dep_file_path(name).is_file() {
            return Err(SboToolkitError::MissingDepFile(name.clone()));
        }
    }
    Ok(())
}

/// What: Parse the command line and run the selected command.
///
/// # Errors
///
/// Propagates every command failure; the caller maps errors to the exit
/// code.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = UserConfig::load()?;
    let mut graph = init_graph(&config)?;

    match cli.command {
        Command::Build {
            review,
            out,
            check_installed,
            check_any_installed,
            deep,
            no_recursive,
            revdeps,
            installed_revdeps,
            repo_db,
            packages,
        } => {
            let (output_mode, output_name) = resolve_output(&out)?;
            let mut options = PkgOptions {
                review_type: resolve_review_type(&review),
                output_mode,
                output_name,
                recursive: !no_recursive,
                revdeps: revdeps || installed_revdeps,
                installed_revdeps,
                ..PkgOptions::default()
            };
            if deep {
                options.deep = true;
            }
            if check_any_installed {
                options.check_installed = CheckInstalled::Any;
            } else if check_installed {
                options.check_installed = CheckInstalled::Tagged;
            }

            require_dep_files(&packages, &config)?;
            let db = open_oracle(repo_db, &config)?;
            queue::run_build(db.as_ref(), &mut graph, &packages, &options, &config)
        }

        Command::Remove {
            out,
            deep,
            repo_db,
            packages,
        } => {
            let (output_mode, output_name) = resolve_output(&out)?;
            let mut options = PkgOptions {
                output_mode,
                output_name,
                revdeps: true,
                ..PkgOptions::default()
            };
            if deep {
                options.deep = true;
            }

            require_dep_files(&packages, &config)?;
            let db = open_oracle(repo_db, &config)?;
            queue::run_remove(db.as_ref(), &mut graph, &packages, &options, &config)
        }

        Command::Update {
            review,
            out,
            installed_revdeps,
            rebuild_deps,
            repo_db,
            packages,
        } => {
            let (output_mode, output_name) = resolve_output(&out)?;
            let options = PkgOptions {
                review_type: resolve_review_type(&review),
                output_mode,
                output_name,
                installed_revdeps,
                rebuild_deps,
                ..PkgOptions::default()
            };

            require_dep_files(&packages, &config)?;
            let db = open_oracle(repo_db, &config)?;
            queue::run_update(db.as_ref(), &mut graph, &packages, &options, &config)
        }

        Command::Updatedb => queue::run_updatedb(&mut graph, &config),

        Command::CheckUpdates { repo_db, package } => {
            let db = open_oracle(repo_db, &config)?;
            queue::run_check_updates(db.as_ref(), &graph, package.as_deref(), &config)
        }

        Command::Review { package } => {
            let reviewed = review::run_review(&mut graph, &package, &config)?;
            if !reviewed {
                mesg::warn(&format!("package {package} not added to REVIEWED"));
            }
            Ok(())
        }

        Command::Info { package } => review::run_info(&mut graph, &package, &config),

        Command::Edit { package } => review::run_edit(&mut graph, &package, &config),

        Command::Search { pattern } => search::run_search(&mut graph, &pattern, &config),

        Command::MakeMeta { output, packages } => {
            require_dep_files(&packages, &config)?;
            search::run_make_meta(&graph, &output, &packages, &config)?;
            mesg::ok(&format!("created meta-package {output}"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_review_type_default() {
        assert_eq!(
            resolve_review_type(&ReviewFlags::default()),
            ReviewType::Enabled
        );
    }

    #[test]
    fn test_resolve_review_type_priority() {
        let flags = ReviewFlags {
            auto_review: true,
            auto_review_verbose: true,
            ignore_review: false,
        };
        assert_eq!(resolve_review_type(&flags), ReviewType::AutoVerbose);

        let flags = ReviewFlags {
            auto_review: true,
            auto_review_verbose: true,
            ignore_review: true,
        };
        assert_eq!(resolve_review_type(&flags), ReviewType::Disabled);
    }

    #[test]
    fn test_resolve_output_modes() {
        let (mode, name) = resolve_output(&OutputFlags::default()).unwrap();
        assert_eq!(mode, OutputMode::File);
        assert!(name.is_none());

        let flags = OutputFlags {
            list: true,
            ..OutputFlags::default()
        };
        assert_eq!(resolve_output(&flags).unwrap().0, OutputMode::Stdout);

        let flags = OutputFlags {
            list_slackpkg: Some(1),
            ..OutputFlags::default()
        };
        assert_eq!(resolve_output(&flags).unwrap().0, OutputMode::Slackpkg1);

        let flags = OutputFlags {
            list_slackpkg: Some(3),
            ..OutputFlags::default()
        };
        assert!(resolve_output(&flags).is_err());
    }

    #[test]
    fn test_cli_parses_build_flags() {
        let cli =
            Cli::try_parse_from(["sbq", "build", "-c", "-p", "-o", "out.sqf", "htop"]).unwrap();
        match cli.command {
            Command::Build {
                check_installed,
                revdeps,
                out,
                packages,
                ..
            } => {
                assert!(check_installed);
                assert!(revdeps);
                assert_eq!(out.output.as_deref(), Some("out.sqf"));
                assert_eq!(packages, vec!["htop"]);
            }
            other => panic!("parsed wrong command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_conflicting_output_flags() {
        assert!(Cli::try_parse_from(["sbq", "build", "-l", "-o", "out.sqf", "htop"]).is_err());
        assert!(Cli::try_parse_from(["sbq", "update", "-L", "1", "-o", "x", "htop"]).is_err());
    }

    #[test]
    fn test_cli_requires_packages() {
        assert!(Cli::try_parse_from(["sbq", "build"]).is_err());
        assert!(Cli::try_parse_from(["sbq", "make-meta", "-o", "group"]).is_err());
    }
}
