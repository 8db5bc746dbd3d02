//! Output documents
//!
//! The used-files document is a flat list of every source file that went
//! into the build, derived from the finished graph.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Error;
use crate::graph::CmdGraph;
use crate::paths;
use crate::report::report_warning;

pub const USED_FILES_FILE_NAME: &str = "sbom.used-files.txt";

/// The source files used by the build: every graph node under the source
/// tree and outside the object tree, relative to the source tree. When both
/// trees are the same directory that classification is impossible and all
/// nodes are returned instead.
pub fn used_files(graph: &CmdGraph, config: &Config) -> Vec<PathBuf> {
    if config.src_tree == config.obj_tree {
        report_warning!(
            "Extracting all files from the cmd graph to {} instead of only source files because source files cannot be reliably classified when the source and object trees are identical.",
            USED_FILES_FILE_NAME
        );
        return graph
            .iter()
            .map(|node| paths::relative_to(&node.absolute_path, &config.src_tree))
            .collect();
    }
    graph
        .iter()
        .filter(|node| {
            paths::is_relative_to(&node.absolute_path, &config.src_tree)
                && !paths::is_relative_to(&node.absolute_path, &config.obj_tree)
        })
        .map(|node| paths::relative_to(&node.absolute_path, &config.src_tree))
        .collect()
}

/// Write the used-files document into the output directory and return its
/// path.
pub fn write_used_files(graph: &CmdGraph, config: &Config) -> Result<PathBuf, Error> {
    let files = used_files(graph, config);
    let path = config.output_directory.join(USED_FILES_FILE_NAME);
    let content = files
        .iter()
        .map(|file| file.display().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(&path, content).map_err(|e| Error::WriteFile(path.display().to_string(), e))?;
    Ok(path)
}
