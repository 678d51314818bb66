//! Package graph, lazy dep-file loading, and the traversal iterator.

mod catalog;
mod iter;
mod loader;

pub use catalog::PackageGraph;
pub use iter::{GraphIter, IterFlags, TraversalState, Visit};
pub use loader::{
    DepFile, create_default_dep, create_default_dep_verbose, default_dep_contents,
    find_all_meta_pkgs, is_meta_file, load_all_deps, load_dep, load_installed_deps,
    parse_dep_file, resolve_node,
};
