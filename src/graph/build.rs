//! Graph construction
//!
//! Recursive, memoized descent from the root artifacts. Every node is
//! inserted into the cache before its children are built, so shared
//! dependencies resolve to the same node and re-entry short-circuits instead
//! of recursing forever.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::cmd::{CmdFile, CmdFileParser, DepsParser, IncbinParser, SavedcmdParser};
use crate::config::Config;
use crate::error::Error;
use crate::graph::{hardcoded_dependencies, CmdGraph, CmdGraphNode, IncbinDependency, NodeId};
use crate::paths;
use crate::report::{report_error, report_warning, trace};

impl CmdGraph {
    /// Recursively build the dependency graph for the roots named in
    /// `config`, discovering dependencies mainly by parsing `.cmd` files.
    pub fn build(config: &Config) -> Result<Self, Error> {
        let mut builder = GraphBuilder::new(config)?;
        let mut roots = Vec::with_capacity(config.root_paths.len());
        for root_path in &config.root_paths {
            trace!("building {}", root_path.display());
            roots.push(builder.build_node(root_path));
        }
        Ok(Self {
            nodes: builder.nodes,
            roots,
        })
    }
}

struct GraphBuilder<'a> {
    config: &'a Config,
    savedcmd: SavedcmdParser,
    cmd_file: CmdFileParser,
    deps: DepsParser,
    incbin: IncbinParser,
    nodes: Vec<CmdGraphNode>,
    /// Memoization cache keyed by normalized absolute path.
    cache: FxHashMap<PathBuf, NodeId>,
}

impl<'a> GraphBuilder<'a> {
    fn new(config: &'a Config) -> Result<Self, Error> {
        Ok(Self {
            config,
            savedcmd: SavedcmdParser::new()?,
            cmd_file: CmdFileParser::new()?,
            deps: DepsParser::new()?,
            incbin: IncbinParser::new()?,
            nodes: Vec::new(),
            cache: FxHashMap::default(),
        })
    }

    /// Build the node for `target_path` (relative to the object tree) and,
    /// recursively, for everything it depends on.
    fn build_node(&mut self, target_path: &Path) -> NodeId {
        let absolute = paths::absolutize(&self.config.obj_tree, target_path);
        if let Some(&id) = self.cache.get(&absolute) {
            return id;
        }

        let sidecar = paths::cmd_sidecar(&absolute);
        let cmd_file = if sidecar.exists() {
            self.cmd_file.parse(&sidecar)
        } else {
            None
        };

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(CmdGraphNode::new(absolute.clone(), cmd_file));
        self.cache.insert(absolute.clone(), id);

        if !absolute.exists() {
            if paths::is_relative_to(&absolute, &self.config.obj_tree)
                || paths::is_relative_to(&absolute, &self.config.src_tree)
            {
                report_error!(
                    "Skip parsing '{}' because file does not exist",
                    absolute.display()
                );
            } else {
                report_warning!(
                    "Skip parsing {} because file does not exist",
                    absolute.display()
                );
            }
            return id;
        }

        // Child paths are always relative to the object tree.
        let hardcoded =
            hardcoded_dependencies(&absolute, &self.config.obj_tree, &self.config.src_tree);
        let mut hardcoded_ids = Vec::with_capacity(hardcoded.len());
        for dependency_path in &hardcoded {
            hardcoded_ids.push(self.build_node(dependency_path));
        }
        self.nodes[id.index()].hardcoded_dependencies = hardcoded_ids;

        let dependency_paths = match &self.nodes[id.index()].cmd_file {
            Some(cmd_file) => self.cmd_file_dependency_paths(cmd_file, target_path),
            None => Vec::new(),
        };
        let mut cmd_file_ids = Vec::with_capacity(dependency_paths.len());
        for dependency_path in &dependency_paths {
            cmd_file_ids.push(self.build_node(dependency_path));
        }
        self.nodes[id.index()].cmd_file_dependencies = cmd_file_ids;

        if absolute.extension() == Some(OsStr::new("S")) {
            let statements = self.incbin_dependency_paths(&absolute, target_path);
            let mut incbin_deps = Vec::with_capacity(statements.len());
            for (dependency_path, full_statement) in statements {
                let node = self.build_node(&dependency_path);
                incbin_deps.push(IncbinDependency {
                    node,
                    full_statement,
                });
            }
            self.nodes[id.index()].incbin_dependencies = incbin_deps;
        }

        id
    }

    /// Dependency paths of a target per its `.cmd` file, relative to the
    /// object tree: command inputs plus the `deps_` list, response files
    /// expanded, relative inputs rebased onto the resolved working
    /// directory, and the target itself removed.
    fn cmd_file_dependency_paths(&self, cmd_file: &CmdFile, target_path: &Path) -> Vec<PathBuf> {
        let mut input_files = self
            .savedcmd
            .parse_inputs(&cmd_file.savedcmd, self.config.fail_on_unknown_build_command);
        if !cmd_file.deps.is_empty() {
            input_files.extend(self.deps.parse(&cmd_file.deps));
        }
        let input_files = self.expand_response_files(input_files);

        let mut dependency_paths = Vec::with_capacity(input_files.len());
        let mut working_directory: Option<PathBuf> = None;
        for input_file in &input_files {
            let input_path = Path::new(input_file);
            if input_path.is_absolute() {
                dependency_paths.push(paths::relative_to(input_path, &self.config.obj_tree));
                continue;
            }

            if working_directory.is_none() {
                // The directory the command ran in is not recorded anywhere,
                // so it is estimated from the first relative input. All
                // inputs of one command share it.
                working_directory = self.working_directory(input_file, target_path);
                if working_directory.is_none() {
                    report_error!(
                        "Skip children of node {} because no working directory for relative input {} could be found",
                        target_path.display(),
                        input_file
                    );
                    return Vec::new();
                }
            }
            if let Some(working_directory) = &working_directory {
                dependency_paths.push(paths::normalize(working_directory.join(input_path)));
            }
        }

        // Some multi-stage commands re-read their own output (e.g. objcopy
        // in-place); drop the target to keep the graph cycle-free.
        let target = paths::normalize(target_path);
        dependency_paths.retain(|dependency| *dependency != target);
        dependency_paths
    }

    /// Resolved `.incbin` child paths of an `.S` source, with the statement
    /// each one came from.
    fn incbin_dependency_paths(
        &self,
        absolute: &Path,
        target_path: &Path,
    ) -> Vec<(PathBuf, String)> {
        let statements = match self.incbin.parse(absolute) {
            Ok(statements) => statements,
            Err(e) => {
                report_error!(
                    "Skip .incbin scan of '{}' because the file cannot be read: {}",
                    absolute.display(),
                    e
                );
                return Vec::new();
            }
        };
        let Some(first) = statements.first() else {
            return Vec::new();
        };
        let Some(working_directory) = self.working_directory(&first.path, target_path) else {
            report_error!(
                "Skip children of node {} because no working directory for {} could be found",
                target_path.display(),
                first.full_statement
            );
            return Vec::new();
        };
        statements
            .into_iter()
            .map(|statement| {
                (
                    paths::normalize(working_directory.join(&statement.path)),
                    statement.full_statement,
                )
            })
            .collect()
    }

    /// Estimate the directory (relative to the object tree) the recorded
    /// command was executed from, probing where `input_file` exists:
    /// next to the target, at the object-tree root, or under the known
    /// objtool subtrees built out of place.
    fn working_directory(&self, input_file: &str, target_path: &Path) -> Option<PathBuf> {
        let obj_tree = &self.config.obj_tree;
        let src_tree = &self.config.src_tree;
        let target_dir = target_path.parent().unwrap_or(Path::new(""));

        if obj_tree.join(target_dir).join(input_file).exists() {
            return Some(target_dir.to_path_buf());
        }
        if obj_tree.join(input_file).exists() {
            return Some(PathBuf::from("."));
        }
        if target_path.starts_with("tools/objtool/arch/x86") {
            // e.g. `tools/objtool/arch/x86/special.o` has input `arch/x86/special.c`
            return Some(paths::relative_to(src_tree, obj_tree).join("tools/objtool"));
        }
        if target_path.starts_with("tools/objtool/libsubcmd") {
            // e.g. `tools/objtool/libsubcmd/.sigchain.o` has input `subcmd-util.h`
            // which lives in `tools/lib/subcmd/subcmd-util.h`
            return Some(paths::relative_to(src_tree, obj_tree).join("tools/lib/subcmd"));
        }

        None
    }

    /// Expand `@file` response-file references: each one names a file
    /// (relative to the object tree) whose non-blank lines are further
    /// inputs, recursively.
    fn expand_response_files(&self, input_files: Vec<String>) -> Vec<String> {
        let mut expanded = Vec::with_capacity(input_files.len());
        for input_file in input_files {
            let Some(response_file) = input_file.strip_prefix('@') else {
                expanded.push(input_file);
                continue;
            };
            let response_path = self.config.obj_tree.join(response_file);
            let content = match std::fs::read_to_string(&response_path) {
                Ok(content) => content,
                Err(e) => {
                    report_error!(
                        "Skip response file {} because it cannot be read: {}",
                        input_file,
                        e
                    );
                    continue;
                }
            };
            let lines: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            expanded.extend(self.expand_response_files(lines));
        }
        expanded
    }
}
