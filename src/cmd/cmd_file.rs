//! .cmd file parsing
//!
//! The kernel build system records, next to every artifact it produces, a
//! `.<artifact>.cmd` file with the exact command line and the dependency
//! list. Three shapes occur:
//!
//! 1. Full form
//!    ```text
//!    savedcmd_<output> := <command>
//!    source_<output> := <main_input>
//!    deps_<output> := \
//!      <dependency> \
//!      ...
//!    <output>: $(deps_<output>)
//!    $(deps_<output>):
//!    ```
//! 2. Command-only form: the `savedcmd_` line alone.
//! 3. Single-dependency form: the `savedcmd_` line plus one `<output>: <dep>`
//!    line.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::report::report_error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdFile {
    /// Absolute path of the `.cmd` file itself.
    pub path: PathBuf,
    /// The recorded shell command, exactly as written.
    pub savedcmd: String,
    /// Primary source file as recorded by the build system.
    pub source: Option<String>,
    /// Raw dependency strings, before any interpretation.
    pub deps: Vec<String>,
    /// Residual make lines, kept verbatim but not interpreted.
    pub make_rules: Vec<String>,
}

pub struct CmdFileParser {
    savedcmd: Regex,
    source: Regex,
}

impl CmdFileParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            savedcmd: Regex::new(r"^(saved)?cmd_[^:]*:=\s*(.+)$")?,
            source: Regex::new(r"^source_[^:]*:=\s*(.+)$")?,
        })
    }

    /// Parse the `.cmd` file at `path`. Malformed files are reported and
    /// yield `None` (or a partially filled record when only the tail is
    /// broken), so one bad sidecar never stops the graph walk.
    pub fn parse(&self, path: &Path) -> Option<CmdFile> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                report_error!("Skip parsing '{}' because it cannot be read: {}", path.display(), e);
                return None;
            }
        };
        self.parse_content(path, &content)
    }

    fn parse_content(&self, path: &Path, content: &str) -> Option<CmdFile> {
        let lines: Vec<&str> = content
            .lines()
            .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
            .map(str::trim)
            .collect();

        // savedcmd
        let savedcmd = lines.first().and_then(|line| {
            self.savedcmd
                .captures(line)
                .map(|captures| captures[2].to_string())
        });
        let Some(savedcmd) = savedcmd else {
            report_error!(
                "Skip parsing '{}' because no 'savedcmd_' command was found.",
                path.display()
            );
            return None;
        };

        // command-only form
        if lines.len() == 1 {
            return Some(CmdFile {
                path: path.to_path_buf(),
                savedcmd,
                source: None,
                deps: Vec::new(),
                make_rules: Vec::new(),
            });
        }

        // single-dependency form: `<target>: <dep>`
        if lines.len() == 2 {
            let dep = match lines[1].split(':').nth(1) {
                Some(dep) => dep.trim().to_string(),
                None => {
                    report_error!(
                        "Skip dependency line of '{}' because it is not of the form 'target: dep'",
                        path.display()
                    );
                    return Some(CmdFile {
                        path: path.to_path_buf(),
                        savedcmd,
                        source: None,
                        deps: Vec::new(),
                        make_rules: Vec::new(),
                    });
                }
            };
            return Some(CmdFile {
                path: path.to_path_buf(),
                savedcmd,
                source: None,
                deps: vec![dep],
                make_rules: Vec::new(),
            });
        }

        // full form
        let source = self
            .source
            .captures(lines[1])
            .map(|captures| captures[1].to_string());
        let Some(source) = source else {
            report_error!(
                "Skip parsing '{}' because no 'source_' entry was found.",
                path.display()
            );
            return Some(CmdFile {
                path: path.to_path_buf(),
                savedcmd,
                source: None,
                deps: Vec::new(),
                make_rules: Vec::new(),
            });
        };

        // lines[2] holds the `deps_` assignment itself, the dependencies
        // start on the next line and continue while they end with `\`
        let mut deps = Vec::new();
        let mut i = 3;
        while i < lines.len() {
            let Some(dep) = lines[i].strip_suffix('\\') else {
                break;
            };
            deps.push(dep.trim().to_string());
            i += 1;
        }

        let make_rules = lines[i..].iter().map(|line| line.to_string()).collect();

        Some(CmdFile {
            path: path.to_path_buf(),
            savedcmd,
            source: Some(source),
            deps,
            make_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report;

    fn parse(content: &str) -> Option<CmdFile> {
        report::init();
        let parser = CmdFileParser::new().unwrap();
        parser.parse_content(Path::new("/obj/.vmlinux.cmd"), content)
    }

    #[test]
    fn full_form() {
        let content = "\
savedcmd_arch/x86/pci/i386.o := gcc -c -o arch/x86/pci/i386.o ../arch/x86/pci/i386.c

source_arch/x86/pci/i386.o := ../arch/x86/pci/i386.c

deps_arch/x86/pci/i386.o := \\
  ../include/linux/kconfig.h \\
  $(wildcard include/config/CC_VERSION_TEXT) \\
  ../include/linux/compiler-version.h \\

arch/x86/pci/i386.o: $(deps_arch/x86/pci/i386.o)

$(deps_arch/x86/pci/i386.o):
";
        let cmd_file = parse(content).unwrap();
        assert_eq!(
            cmd_file.savedcmd,
            "gcc -c -o arch/x86/pci/i386.o ../arch/x86/pci/i386.c"
        );
        assert_eq!(cmd_file.source.as_deref(), Some("../arch/x86/pci/i386.c"));
        assert_eq!(
            cmd_file.deps,
            vec![
                "../include/linux/kconfig.h",
                "$(wildcard include/config/CC_VERSION_TEXT)",
                "../include/linux/compiler-version.h",
            ]
        );
        assert_eq!(
            cmd_file.make_rules,
            vec![
                "arch/x86/pci/i386.o: $(deps_arch/x86/pci/i386.o)",
                "$(deps_arch/x86/pci/i386.o):",
            ]
        );
        assert!(!report::has_errors());
    }

    #[test]
    fn command_only_form() {
        let cmd_file = parse("cmd_vmlinux := objcopy vmlinux.unstripped vmlinux\n").unwrap();
        assert_eq!(cmd_file.savedcmd, "objcopy vmlinux.unstripped vmlinux");
        assert_eq!(cmd_file.source, None);
        assert!(cmd_file.deps.is_empty());
        assert!(cmd_file.make_rules.is_empty());
        assert!(!report::has_errors());
    }

    #[test]
    fn single_dependency_form() {
        let content = "\
savedcmd_usr/initramfs_data.cpio := sh ../usr/gen_initramfs.sh -o usr/initramfs_data.cpio ../usr/default_cpio_list
usr/initramfs_data.cpio: ../usr/default_cpio_list
";
        let cmd_file = parse(content).unwrap();
        assert_eq!(cmd_file.deps, vec!["../usr/default_cpio_list"]);
        assert!(!report::has_errors());
    }

    #[test]
    fn comments_and_blank_lines_are_dropped() {
        let cmd_file = parse("# generated\n\nsavedcmd_x := touch x\n").unwrap();
        assert_eq!(cmd_file.savedcmd, "touch x");
    }

    #[test]
    fn missing_savedcmd_is_reported() {
        assert!(parse("source_x := ../x.c\n").is_none());
        assert!(report::has_errors());
    }

    #[test]
    fn missing_source_keeps_the_command() {
        let content = "\
savedcmd_x := gcc -c -o x.o ../x.c
deps_x := \\
  ../x.h \\
rules
";
        let cmd_file = parse(content).unwrap();
        assert_eq!(cmd_file.savedcmd, "gcc -c -o x.o ../x.c");
        assert_eq!(cmd_file.source, None);
        assert!(cmd_file.deps.is_empty());
        assert!(report::has_errors());
    }

    #[test]
    fn empty_file_is_reported() {
        assert!(parse("").is_none());
        assert!(report::has_errors());
    }
}
