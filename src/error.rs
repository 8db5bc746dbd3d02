//! Error types

use crate::report;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // config
    #[error("`--src-tree` `{0}` does not exist")]
    SrcTreeMissing(String),
    #[error("`--obj-tree` `{0}` does not exist")]
    ObjTreeMissing(String),
    #[error("Root artifact `{0}` does not exist and has no `.cmd` sidecar")]
    RootMissing(String),
    #[error("Please specify the root artifacts with `--roots` or `--roots-file`")]
    NoRoots,
    #[error("Invalid path `{0}`: {1}")]
    InvalidPath(String, std::io::Error),

    // fs
    #[error("Cannot read file `{0}`: {1}")]
    ReadFile(String, std::io::Error),
    #[error("Cannot write file `{0}`: {1}")]
    WriteFile(String, std::io::Error),

    // graph cache
    #[error("Cannot parse `{0}`: {1}")]
    ParseJson(String, serde_json::Error),
    #[error("Cannot serialize `{0}`: {1}")]
    SerializeJson(String, serde_json::Error),
    #[error("Graph cache `{0}` has version {1} but this build expects {2}; delete it to rebuild")]
    CacheVersion(String, u32, u32),

    // run outcome
    #[error("Sbom generation failed with {0} error(s). Check errors above.")]
    GenerationFailed(usize),

    #[error("parsing regex: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    pub fn print(&self) {
        report::fatal(&self.to_string());
    }
}
