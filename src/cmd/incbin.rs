//! `.incbin` scanning
//!
//! Assembly sources can embed binary files verbatim via the `.incbin`
//! directive; those files are build inputs even though no `.cmd` file
//! mentions them.

use std::path::Path;

use regex::Regex;

/// A parsed `.incbin "<path>"` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncbinStatement {
    /// The path exactly as written inside the directive.
    pub path: String,
    /// The full statement as it appeared in the file, for reporting.
    pub full_statement: String,
}

pub struct IncbinParser {
    pattern: Regex,
}

impl IncbinParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r#"\s*\.incbin\s+"([^"]+)""#)?,
        })
    }

    /// Scan an `.S` assembly file for `.incbin` directives.
    pub fn parse(&self, path: &Path) -> Result<Vec<IncbinStatement>, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.parse_content(&content))
    }

    fn parse_content(&self, content: &str) -> Vec<IncbinStatement> {
        self.pattern
            .captures_iter(content)
            .map(|captures| IncbinStatement {
                path: captures[1].to_string(),
                full_statement: captures[0].trim().to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Vec<IncbinStatement> {
        IncbinParser::new().unwrap().parse_content(content)
    }

    #[test]
    fn finds_incbin_directives() {
        let content = r#"
    .section .init.ramfs, "a"
__irf_start:
    .incbin "usr/initramfs_inc_data"
__irf_end:
    .incbin "arch/x86/boot/compressed/vmlinux.bin.gz"
"#;
        let statements = parse(content);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].path, "usr/initramfs_inc_data");
        assert_eq!(statements[0].full_statement, r#".incbin "usr/initramfs_inc_data""#);
        assert_eq!(statements[1].path, "arch/x86/boot/compressed/vmlinux.bin.gz");
    }

    #[test]
    fn ignores_files_without_incbin() {
        assert!(parse(".text\nmov %eax, %ebx\n").is_empty());
    }
}
