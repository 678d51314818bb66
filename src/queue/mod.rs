//! Queue generators and catalog-maintenance commands.

pub mod build;
pub mod check;
pub mod remove;
pub mod update;
pub mod updatedb;

pub use build::{run_build, write_sqf};
pub use check::run_check_updates;
pub use remove::run_remove;
pub use update::run_update;
pub use updatedb::{create_default_deps, run_updatedb};
