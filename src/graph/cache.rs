//! Graph cache
//!
//! Serializes the whole graph to a single file so repeated runs against the
//! same build tree skip the rebuild. The format is an implementation detail;
//! a version stamp in the envelope rejects caches written by a different
//! build of this tool instead of mis-parsing them.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::graph::CmdGraph;
use crate::report::trace;

pub const CACHE_VERSION: u32 = 1;

#[derive(Serialize)]
struct CacheEnvelope<'a> {
    version: u32,
    graph: &'a CmdGraph,
}

/// Deserialization counterpart: the version is checked before the graph
/// payload is interpreted.
#[derive(Deserialize)]
struct RawCacheEnvelope {
    version: u32,
    graph: serde_json::Value,
}

pub fn save(graph: &CmdGraph, path: &Path) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| Error::WriteFile(path.display().to_string(), e))?;
    let envelope = CacheEnvelope {
        version: CACHE_VERSION,
        graph,
    };
    serde_json::to_writer(BufWriter::new(file), &envelope)
        .map_err(|e| Error::SerializeJson(path.display().to_string(), e))
}

pub fn load(path: &Path) -> Result<CmdGraph, Error> {
    let file = File::open(path).map_err(|e| Error::ReadFile(path.display().to_string(), e))?;
    let envelope: RawCacheEnvelope = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::ParseJson(path.display().to_string(), e))?;
    if envelope.version != CACHE_VERSION {
        return Err(Error::CacheVersion(
            path.display().to_string(),
            envelope.version,
            CACHE_VERSION,
        ));
    }
    serde_json::from_value(envelope.graph)
        .map_err(|e| Error::ParseJson(path.display().to_string(), e))
}

/// Load the graph from `cache_path` when it exists, otherwise build it and
/// write the cache for the next run.
pub fn build_or_load(config: &Config, cache_path: &Path) -> Result<CmdGraph, Error> {
    if cache_path.exists() {
        trace!("loading cmd graph from {}", cache_path.display());
        return load(cache_path);
    }
    let graph = CmdGraph::build(config)?;
    trace!("saving cmd graph to {}", cache_path.display());
    save(&graph, cache_path)?;
    Ok(graph)
}
