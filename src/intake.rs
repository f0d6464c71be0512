use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::correlation::CorrelationMap;

/// Only files with this suffix are accepted.
pub const EML_SUFFIX: &str = ".eml";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A file offered by the picker or a drop, before filtering.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Client-side identifier tying a placeholder panel to its server result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Allocates an id that is unique for the lifetime of the process.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("file-{}-{}", millis, seq))
    }

    /// Wraps an id received back from the page (route parameter).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file accepted into a batch.
#[derive(Debug, Clone)]
pub struct AcceptedFile {
    pub id: CorrelationId,
    pub name: String,
    pub content: Vec<u8>,
}

/// Files accepted from one user action together with their correlation map.
#[derive(Debug)]
pub struct UploadBatch {
    pub files: Vec<AcceptedFile>,
    pub correlation: CorrelationMap,
}

impl UploadBatch {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub fn is_eml(name: &str) -> bool {
    name.ends_with(EML_SUFFIX)
}

/// Filters candidates down to `.eml` files and assigns correlation ids.
///
/// Returns `None` when nothing survives the filter. Within one batch the first
/// file of a given name wins; later duplicates are dropped.
pub fn accept_files(candidates: Vec<CandidateFile>) -> Option<UploadBatch> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    let mut correlation = CorrelationMap::default();

    for candidate in candidates {
        if !is_eml(&candidate.name) {
            log::debug!("Skipping non-eml file {}", candidate.name);
            continue;
        }
        if !seen.insert(candidate.name.clone()) {
            log::debug!("Skipping duplicate file name {} in batch", candidate.name);
            continue;
        }

        let id = CorrelationId::generate();
        correlation.insert(&candidate.name, id.clone());
        files.push(AcceptedFile {
            id,
            name: candidate.name,
            content: candidate.content,
        });
    }

    if files.is_empty() {
        None
    } else {
        Some(UploadBatch { files, correlation })
    }
}
