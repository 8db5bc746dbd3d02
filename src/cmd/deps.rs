//! Dependency-list parsing
//!
//! Converts the raw `deps_` strings of a `.cmd` file into input paths.
//! Kconfig stamps and the objtool probe are build bookkeeping, not inputs,
//! and are dropped.

use regex::Regex;

use crate::report::report_error;

pub struct DepsParser {
    /// Kconfig stamps, e.g. `$(wildcard include/config/CONFIG_SOMETHING)`
    config: Regex,
    /// The objtool binary probe, `$(wildcard ./tools/objtool/objtool)`
    objtool: Regex,
    /// Any other `$(wildcard path/to/file)` reference
    wildcard: Regex,
    /// Ordinary paths: optional leading `/`, directory levels, one final
    /// component, e.g. `/foo/bar.c`, `dir1/dir2/file.txt`, `plainfile`
    valid_path: Regex,
}

impl DepsParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            config: Regex::new(r"^\$\(wildcard (include/config/[^)]+)\)")?,
            objtool: Regex::new(r"^\$\(wildcard \./tools/objtool/objtool\)")?,
            wildcard: Regex::new(r"^\$\(wildcard ([^)]+)\)")?,
            valid_path: Regex::new(r"^(/)?(([\w\-\., ]*)/)*[\w\-\., ]+$")?,
        })
    }

    /// Parse dependency strings into input paths, dropping stamps and
    /// reporting anything of unrecognized shape.
    pub fn parse(&self, deps: &[String]) -> Vec<String> {
        let mut input_files = Vec::new();
        for dep in deps {
            let dep = dep.trim();
            if self.config.is_match(dep) || self.objtool.is_match(dep) {
                continue;
            }
            if let Some(captures) = self.wildcard.captures(dep) {
                input_files.push(captures[1].to_string());
                continue;
            }
            if self.valid_path.is_match(dep) {
                input_files.push(dep.to_string());
                continue;
            }
            report_error!("Skip parsing dependency {} because of unrecognized format", dep);
        }
        input_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report;

    fn parse(deps: &[&str]) -> Vec<String> {
        report::init();
        let parser = DepsParser::new().unwrap();
        parser.parse(&deps.iter().map(|d| d.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn config_stamps_are_dropped() {
        assert!(parse(&["$(wildcard include/config/CC_VERSION_TEXT)"]).is_empty());
        assert!(!report::has_errors());
    }

    #[test]
    fn objtool_probe_is_dropped() {
        assert!(parse(&["$(wildcard ./tools/objtool/objtool)"]).is_empty());
        assert!(!report::has_errors());
    }

    #[test]
    fn wildcard_paths_are_unwrapped() {
        assert_eq!(
            parse(&["$(wildcard arch/x86/boot/setup.ld)"]),
            vec!["arch/x86/boot/setup.ld"]
        );
        assert!(!report::has_errors());
    }

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!(
            parse(&["../include/linux/kconfig.h", "/usr/include/stdc-predef.h", "plainfile"]),
            vec!["../include/linux/kconfig.h", "/usr/include/stdc-predef.h", "plainfile"]
        );
        assert!(!report::has_errors());
    }

    #[test]
    fn unrecognized_formats_are_reported_and_dropped() {
        assert!(parse(&["$(shell date)"]).is_empty());
        assert!(report::has_errors());
    }
}
