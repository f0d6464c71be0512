use std::collections::HashMap;

use crate::intake::CorrelationId;

/// Filename to correlation id, owned by a single upload batch.
#[derive(Debug, Default, Clone)]
pub struct CorrelationMap {
    ids: HashMap<String, CorrelationId>,
}

impl CorrelationMap {
    pub fn insert(&mut self, filename: &str, id: CorrelationId) {
        self.ids.insert(filename.to_string(), id);
    }

    /// Unknown filenames yield `None`; callers ignore such rows.
    pub fn lookup(&self, filename: &str) -> Option<&CorrelationId> {
        self.ids.get(filename)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
