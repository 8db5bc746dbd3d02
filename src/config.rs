//! Core configuration
//!
//! The validated subset of the CLI surface that the engine consumes. All
//! tree paths are absolute by the time a `Config` exists.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::paths;
use crate::KernelSbom;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Absolute path to the Linux kernel source directory.
    pub src_tree: PathBuf,

    /// Absolute path to the build output directory.
    pub obj_tree: PathBuf,

    /// Root artifacts (relative to `obj_tree`) the graph is built from.
    pub root_paths: Vec<PathBuf>,

    /// Whether an unknown build command is an error rather than a warning.
    pub fail_on_unknown_build_command: bool,

    /// Write output documents even when errors were recorded.
    pub write_output_on_error: bool,

    /// Whether to write the used-files document.
    pub generate_used_files: bool,

    /// Directory the generated output documents are written to.
    pub output_directory: PathBuf,

    /// Cache file for the cmd graph; loaded instead of rebuilding when present.
    pub graph_cache: Option<PathBuf>,
}

impl Config {
    pub fn from_cli(cli: &KernelSbom) -> Result<Self, Error> {
        let src_tree = dunce::canonicalize(&cli.src_tree)
            .map_err(|_| Error::SrcTreeMissing(cli.src_tree.clone()))?;
        let obj_tree = dunce::canonicalize(&cli.obj_tree)
            .map_err(|_| Error::ObjTreeMissing(cli.obj_tree.clone()))?;

        let root_paths = if let Some(roots_file) = &cli.roots_file {
            let content = std::fs::read_to_string(roots_file)
                .map_err(|e| Error::ReadFile(roots_file.clone(), e))?;
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(PathBuf::from)
                .collect()
        } else {
            cli.roots.iter().map(PathBuf::from).collect::<Vec<_>>()
        };
        if root_paths.is_empty() {
            return Err(Error::NoRoots);
        }
        for root_path in &root_paths {
            validate_root(&obj_tree, root_path)?;
        }

        let output_directory = dunce::canonicalize(&cli.output_directory)
            .map_err(|e| Error::InvalidPath(cli.output_directory.clone(), e))?;

        Ok(Self {
            src_tree,
            obj_tree,
            root_paths,
            fail_on_unknown_build_command: !cli.do_not_fail_on_unknown_build_command,
            write_output_on_error: cli.write_output_on_error,
            generate_used_files: cli.generate_used_files,
            output_directory,
            graph_cache: cli.graph_cache.as_ref().map(PathBuf::from),
        })
    }
}

/// A root must exist under the object tree, or at least have a `.cmd`
/// sidecar there.
fn validate_root(obj_tree: &Path, root_path: &Path) -> Result<(), Error> {
    let absolute = obj_tree.join(root_path);
    if absolute.exists() || paths::cmd_sidecar(&absolute).exists() {
        return Ok(());
    }
    Err(Error::RootMissing(absolute.display().to_string()))
}
