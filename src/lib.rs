//! Dependency graph and build-queue toolkit for SlackBuilds-style source
//! repositories.
//!
//! This crate turns a repository of per-package build-script directories and
//! a set of user-maintained dependency files into ordered build, removal,
//! and update queues (SQF files) consistent with the packages installed on
//! the host.
//!
//! # Overview
//!
//! - **Catalog**: a persistent package database ([`pkgdb`]) synchronized
//!   with the on-disk repository by the [`repo`] scanner, annotated with
//!   per-package review state and an info CRC fingerprint.
//! - **Graph**: lazily loaded dependency edges with cycle detection and a
//!   configurable traversal iterator ([`graph`]) that backs every command.
//! - **Oracle**: two interchangeable views of the installed-package set
//!   ([`installed`]).
//! - **Queues**: build, remove, and update generation plus the update
//!   classifier ([`queue`]), emitted through the [`output`] sink.
//! - **Review**: the interactive gate in front of every queue ([`review`]).
//!
//! # Examples
//!
//! ## Load a catalog and walk a dependency subgraph
//!
//! ```no_run
//! use sbo_toolkit::config::UserConfig;
//! use sbo_toolkit::graph::{self, GraphIter, IterFlags, PackageGraph, TraversalState};
//! use sbo_toolkit::types::PkgOptions;
//!
//! # fn example() -> sbo_toolkit::Result<()> {
//! let config = UserConfig::load()?;
//! let mut graph = PackageGraph::from_packages(sbo_toolkit::pkgdb::load_pkgdb(&config)?);
//!
//! graph::load_dep(&mut graph, "htop", &PkgOptions::default(), &config)?;
//!
//! let mut state = TraversalState::new();
//! let mut iter = GraphIter::begin(&graph, &mut state, "htop", IterFlags::default(), -1)?;
//! while let Some(visit) = iter.next()? {
//!     println!("{} (distance {})", graph.name(visit.id), visit.dist);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Query the installed-package oracle
//!
//! ```no_run
//! use sbo_toolkit::installed::{PackageDatabase, PackagesBackend};
//!
//! # fn example() -> sbo_toolkit::Result<()> {
//! let db = PackagesBackend::open_default()?;
//! if let Some(entry) = db.search("htop", Some("_SBo")) {
//!     println!("{} {} installed", entry.name, entry.version);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
mod fsutil;
pub mod graph;
pub mod installed;
pub mod mesg;
pub mod output;
pub mod pkgdb;
pub mod queue;
pub mod repo;
pub mod review;
pub mod search;
pub mod types;
pub mod version;

/// Prelude module for convenient imports.
///
/// Re-exports the types most callers need, allowing a single
/// `use sbo_toolkit::prelude::*;`.
pub mod prelude;

// Re-export commonly used types
pub use error::{Result, SboToolkitError as Error};
pub use types::{InstalledPackage, NodeId, Package, PkgOptions};
