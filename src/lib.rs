use clap::Parser;

pub mod cmd;
pub mod config;
pub mod env;
pub mod error;
pub mod graph;
pub mod output;
pub mod paths;
pub mod report;

pub use error::Error;

use config::Config;
use graph::CmdGraph;
use report::Severity;

/// CLI entry point
#[derive(Debug, Clone, Default, PartialEq, Parser)]
#[command(author, version, about)]
pub struct KernelSbom {
    /// Path to the Linux kernel source tree
    #[clap(long, default_value = "../linux")]
    pub src_tree: String,

    /// Path to the build object tree directory
    #[clap(long, default_value = "../linux/kernel_build")]
    pub obj_tree: String,

    /// Paths (relative to --obj-tree) of the root artifacts the SBOM is
    /// based on
    #[clap(long, num_args = 1.., conflicts_with = "roots_file")]
    pub roots: Vec<String>,

    /// Path to a file containing the root paths, one per line
    #[clap(long)]
    pub roots_file: Option<String>,

    /// Write sbom.used-files.txt, the flat list of all source files used
    /// for the kernel build
    #[clap(long)]
    pub generate_used_files: bool,

    /// Directory where the generated output documents are saved
    #[clap(long, default_value = ".")]
    pub output_directory: String,

    /// Cache file for the cmd graph; if it exists it is loaded in place of
    /// rebuilding the graph
    #[clap(long)]
    pub graph_cache: Option<String>,

    /// Log unknown build commands as warnings instead of errors
    #[clap(long)]
    pub do_not_fail_on_unknown_build_command: bool,

    /// Write output documents even if errors occur (the documents may be
    /// incomplete)
    #[clap(long)]
    pub write_output_on_error: bool,

    /// Print verbose output
    #[clap(short, long)]
    pub verbose: bool,
}

impl KernelSbom {
    /// Build the cmd graph and write the requested outputs.
    pub fn run(&self) -> Result<(), Error> {
        let config = Config::from_cli(self)?;
        report::init();

        let graph = match &config.graph_cache {
            Some(cache_path) => graph::build_or_load(&config, cache_path)?,
            None => CmdGraph::build(&config)?,
        };
        report::note(&format!(
            "cmd graph: {} nodes from {} roots",
            graph.len(),
            config.root_paths.len()
        ));

        if config.generate_used_files && (!report::has_errors() || config.write_output_on_error) {
            let path = output::write_used_files(&graph, &config)?;
            report::note(&format!("saved {}", path.display()));
        }

        if let Some(summary) = report::summarize_warnings() {
            for line in summary.lines() {
                report::emit(Severity::Warning, line);
            }
        }
        if let Some(summary) = report::summarize_errors() {
            for line in summary.lines() {
                report::emit(Severity::Error, line);
            }
            if !config.write_output_on_error {
                report::note(
                    "You can use --write-output-on-error to generate output documents even when errors occur. Note that in this case the documents may be incomplete.",
                );
            }
            return Err(Error::GenerationFailed(report::error_count()));
        }
        Ok(())
    }
}
