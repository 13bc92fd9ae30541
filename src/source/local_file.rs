//! Trace source backed by one JSON file on the local file system.

use super::TraceSource;
use crate::model::CanonicalTrace;
use crate::parser::parse_bytes;
use crate::utils::error::{SourceError, TraceError};
use log::{debug, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Loads, parses and caches the single trace stored in a file
///
/// The file is read on first retrieval; later calls return the cached
/// trace without touching the file again.
#[derive(Debug)]
pub struct LocalFileTraceSource {
    path: PathBuf,
    trace_id: Option<String>,
    cached: Option<CanonicalTrace>,
}

impl LocalFileTraceSource {
    /// Create a source for `path`
    ///
    /// **Public** - fails fast, before any parsing
    ///
    /// # Errors
    /// * `SourceError::NotFound` - nothing exists at `path`
    /// * `SourceError::NotAFile` - `path` is a directory or other non-regular file
    /// * `SourceError::Io` - metadata could not be read
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(SourceError::NotFound(path)),
            Err(e) => return Err(SourceError::Io(e)),
        };

        if !metadata.is_file() {
            return Err(SourceError::NotAFile(path));
        }

        debug!("Trace source ready: {}", path.display());

        Ok(Self {
            path,
            trace_id: None,
            cached: None,
        })
    }

    /// Trace id to use for OTLP documents, which carry none at top level.
    /// Without it the first span's `traceId` is used.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the trace has already been parsed and cached
    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    /// Parse (if needed) and take ownership of the trace
    pub fn into_trace(mut self) -> Result<CanonicalTrace, TraceError> {
        match self.cached.take() {
            Some(trace) => Ok(trace),
            None => self.load(),
        }
    }

    fn load(&self) -> Result<CanonicalTrace, TraceError> {
        debug!("Reading trace file: {}", self.path.display());
        let bytes = std::fs::read(&self.path).map_err(SourceError::Io)?;

        let trace = parse_bytes(&bytes, self.trace_id.as_deref())?;

        info!(
            "Loaded trace {} from {}: {} records, {} parent links repaired",
            trace.trace_id(),
            self.path.display(),
            trace.len(),
            trace.repairs().parents_repaired()
        );

        Ok(trace)
    }
}

impl TraceSource for LocalFileTraceSource {
    fn trace(&mut self) -> Result<&CanonicalTrace, TraceError> {
        let trace = match self.cached.take() {
            Some(trace) => trace,
            None => self.load()?,
        };
        Ok(self.cached.insert(trace))
    }
}
