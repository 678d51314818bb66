//! Output sink and SQF emission policy.
//!
//! Queues go either to an `.sqf` file (one package per line with optional
//! buildopts) or to the console as a single space-separated line, optionally
//! decorated with the slackpkg repository name. Console output is buffered
//! in memory and flushed on close so interactive review prompts never
//! interleave with the queue itself.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SboToolkitError};
use crate::graph::PackageGraph;
use crate::types::{NodeId, OutputMode, PkgOptions};

/// Destination of an [`OutputSink`].
enum SinkTarget {
    /// Process stdout.
    Stdout,
    /// A created file, with its path for diagnostics.
    File(File, PathBuf),
}

/// Byte sink with an optional in-memory buffer and a console predicate.
pub struct OutputSink {
    target: SinkTarget,
    buffer: Option<Vec<u8>>,
}

impl OutputSink {
    /// What: Create a buffered sink writing to stdout on close.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            target: SinkTarget::Stdout,
            buffer: Some(Vec::new()),
        }
    }

    /// What: Create an unbuffered sink writing through to a new file.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| SboToolkitError::io(path, e))?;
        Ok(Self {
            target: SinkTarget::File(file, path.to_path_buf()),
            buffer: None,
        })
    }

    /// True when this sink prints to the console.
    #[must_use]
    pub fn is_console(&self) -> bool {
        matches!(self.target, SinkTarget::Stdout)
    }

    /// Path of the file behind this sink, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            SinkTarget::File(_, path) => Some(path),
            SinkTarget::Stdout => None,
        }
    }

    /// What: Flush any buffered output and close the sink.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the flush fails.
    pub fn close(mut self) -> Result<()> {
        if let Some(buffer) = self.buffer.take() {
            let result = match &mut self.target {
                SinkTarget::Stdout => io::stdout().write_all(&buffer),
                SinkTarget::File(file, _) => file.write_all(&buffer),
            };
            result.map_err(|e| {
                let path = self.path().map_or_else(|| PathBuf::from("stdout"), Path::to_path_buf);
                SboToolkitError::io(path, e)
            })?;
        }
        Ok(())
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(buffer) = &mut self.buffer {
            buffer.extend_from_slice(buf);
            return Ok(buf.len());
        }
        match &mut self.target {
            SinkTarget::Stdout => io::stdout().write(buf),
            SinkTarget::File(file, _) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.target {
            SinkTarget::Stdout => io::stdout().flush(),
            SinkTarget::File(file, _) => file.flush(),
        }
    }
}

/// What: Decorate a package name for the selected output mode.
///
/// Inputs:
/// - `mode`: Output mode.
/// - `pkg_name`: Plain package name.
/// - `repo_name`: Configured slackpkg repository name.
///
/// Output:
/// - Returns `REPO:name` for `Slackpkg1`, `name:REPO` for `Slackpkg2`, and
///   the plain name otherwise.
#[must_use]
pub fn output_name(mode: OutputMode, pkg_name: &str, repo_name: &str) -> String {
    match mode {
        OutputMode::File | OutputMode::Stdout => pkg_name.to_string(),
        OutputMode::Slackpkg1 => format!("{repo_name}:{pkg_name}"),
        OutputMode::Slackpkg2 => format!("{pkg_name}:{repo_name}"),
    }
}

/// What: Resolve the output file name for FILE mode.
///
/// Inputs:
/// - `options`: Output mode and explicit output name.
/// - `pkg_names`: Queue targets; the first one names the default file.
/// - `suffix`: Inserted before `.sqf` in default names (empty for build
///   queues, `-remove` for removals).
///
/// Output:
/// - Returns `None` for console modes, the explicit `-o` name when given,
///   and `<first><suffix>.sqf` otherwise.
///
/// # Errors
///
/// Returns `Config` when several targets are queued to a file without an
/// explicit output name, or when there are no targets at all.
pub fn resolve_output_name(
    options: &PkgOptions,
    pkg_names: &[String],
    suffix: &str,
) -> Result<Option<String>> {
    if options.output_mode != OutputMode::File {
        return Ok(None);
    }

    if let Some(name) = &options.output_name {
        return Ok(Some(name.clone()));
    }

    let Some(first) = pkg_names.first() else {
        return Err(SboToolkitError::Config("no output targets".into()));
    };
    if pkg_names.len() > 1 {
        return Err(SboToolkitError::Config(
            "multiple packages require an explicit output file (--output/-o)".into(),
        ));
    }
    Ok(Some(format!("{first}{suffix}.sqf")))
}

/// What: Open the sink selected by the options.
///
/// Details:
/// - FILE mode creates the file named by [`resolve_output_name`]; console
///   modes return a buffered stdout sink.
///
/// # Errors
///
/// Propagates [`resolve_output_name`] failures, plus `Io` when the file
/// cannot be created.
pub fn open_sink(options: &PkgOptions, pkg_names: &[String], suffix: &str) -> Result<OutputSink> {
    match resolve_output_name(options, pkg_names, suffix)? {
        Some(name) => OutputSink::create(Path::new(&name)),
        None => Ok(OutputSink::stdout()),
    }
}

/// What: Emit a finished queue through a sink.
///
/// Inputs:
/// - `sink`: Destination.
/// - `graph`: Catalog backing the node handles.
/// - `nodes`: Queue in collection order.
/// - `reverse`: Emit in reverse order (reverse-dependency queues).
/// - `mode`: Output mode, controlling layout and name decoration.
/// - `repo_name`: Configured slackpkg repository name.
///
/// Details:
/// - FILE mode writes one name per line with a ` | opt…` buildopts suffix
///   when present; console modes write one space-separated line terminated
///   by a newline (only when anything was emitted).
///
/// # Errors
///
/// Returns `Io` when writing fails.
pub fn write_queue(
    sink: &mut OutputSink,
    graph: &PackageGraph,
    nodes: &[NodeId],
    reverse: bool,
    mode: OutputMode,
    repo_name: &str,
) -> Result<()> {
    let io_err = |e: io::Error| SboToolkitError::io("output", e);

    let ordered: Box<dyn Iterator<Item = &NodeId>> = if reverse {
        Box::new(nodes.iter().rev())
    } else {
        Box::new(nodes.iter())
    };

    let mut wrote_any = false;
    for &id in ordered {
        let pkg = graph.node(id);
        let name = output_name(mode, &pkg.name, repo_name);

        if mode == OutputMode::File {
            write!(sink, "{name}").map_err(io_err)?;
            if !pkg.dep.buildopts.is_empty() {
                write!(sink, " |").map_err(io_err)?;
                for opt in &pkg.dep.buildopts {
                    write!(sink, " {opt}").map_err(io_err)?;
                }
            }
            writeln!(sink).map_err(io_err)?;
        } else {
            write!(sink, "{name} ").map_err(io_err)?;
        }
        wrote_any = true;
    }

    if wrote_any && mode != OutputMode::File {
        writeln!(sink).map_err(io_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Package;
    use tempfile::TempDir;

    #[test]
    fn test_output_name_modes() {
        assert_eq!(output_name(OutputMode::File, "htop", "SBO"), "htop");
        assert_eq!(output_name(OutputMode::Stdout, "htop", "SBO"), "htop");
        assert_eq!(output_name(OutputMode::Slackpkg1, "htop", "SBO"), "SBO:htop");
        assert_eq!(output_name(OutputMode::Slackpkg2, "htop", "SBO"), "htop:SBO");
    }

    #[test]
    fn test_write_queue_file_mode_with_buildopts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.sqf");

        let mut pkg_a = Package::new("a");
        pkg_a.dep.buildopts = vec!["OPT=1".into(), "OPT2=no".into()];
        let graph = PackageGraph::from_packages(vec![pkg_a, Package::new("b")]);
        let a = graph.lookup("a").unwrap();
        let b = graph.lookup("b").unwrap();

        let mut sink = OutputSink::create(&path).unwrap();
        write_queue(&mut sink, &graph, &[b, a], false, OutputMode::File, "SBO").unwrap();
        sink.close().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "b\na | OPT=1 OPT2=no\n"
        );
    }

    #[test]
    fn test_write_queue_reversed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.sqf");

        let graph = PackageGraph::from_packages(vec![Package::new("a"), Package::new("b")]);
        let a = graph.lookup("a").unwrap();
        let b = graph.lookup("b").unwrap();

        let mut sink = OutputSink::create(&path).unwrap();
        write_queue(&mut sink, &graph, &[a, b], true, OutputMode::File, "SBO").unwrap();
        sink.close().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\na\n");
    }

    #[test]
    fn test_resolve_output_name_defaults() {
        let options = PkgOptions::default();
        let names = vec!["htop".to_string()];
        assert_eq!(
            resolve_output_name(&options, &names, "").unwrap(),
            Some("htop.sqf".to_string())
        );
        assert_eq!(
            resolve_output_name(&options, &names, "-remove").unwrap(),
            Some("htop-remove.sqf".to_string())
        );

        let explicit = PkgOptions {
            output_name: Some("queue.sqf".to_string()),
            ..PkgOptions::default()
        };
        assert_eq!(
            resolve_output_name(&explicit, &names, "").unwrap(),
            Some("queue.sqf".to_string())
        );
    }

    #[test]
    fn test_resolve_output_name_rejects_multiple_without_name() {
        let options = PkgOptions::default();
        let names = vec!["a".to_string(), "b".to_string()];
        assert!(resolve_output_name(&options, &names, "").is_err());
    }

    #[test]
    fn test_open_sink_console_is_buffered() {
        let options = PkgOptions {
            output_mode: OutputMode::Stdout,
            ..PkgOptions::default()
        };
        let sink = open_sink(&options, &["a".to_string()], "").unwrap();
        assert!(sink.is_console());
    }
}
