//! Per-file usage tracking.
//!
//! Each source file maps to the set of class identities it currently
//! references. A recompute replaces the file's set wholesale; there is no
//! diffing within a file. The union over all files is the authoritative set of
//! live classes before bundle pruning.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use crate::identity::ClassIdentity;

/// The identities one file references.
pub type FileUsageSet = BTreeSet<ClassIdentity>;

/// Thread-safe map from file id to its usage set.
#[derive(Debug, Default)]
pub struct UsageTracker {
    files: RwLock<BTreeMap<String, FileUsageSet>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the usage set of `file_id`.
    ///
    /// An empty set removes the file, so a file that lost all of its
    /// declarations stops contributing to [`all_live_identities`](Self::all_live_identities).
    pub fn recompute<I>(&self, file_id: &str, identities: I) -> FileUsageSet
    where
        I: IntoIterator<Item = ClassIdentity>,
    {
        let set: FileUsageSet = identities.into_iter().collect();
        let mut files = self.files.write();
        if set.is_empty() {
            files.remove(file_id);
        } else {
            files.insert(file_id.to_string(), set.clone());
        }
        set
    }

    /// Stops tracking `file_id`, returning its last set.
    pub fn remove_file(&self, file_id: &str) -> Option<FileUsageSet> {
        self.files.write().remove(file_id)
    }

    pub fn usage_of(&self, file_id: &str) -> Option<FileUsageSet> {
        self.files.read().get(file_id).cloned()
    }

    pub fn is_tracked(&self, file_id: &str) -> bool {
        self.files.read().contains_key(file_id)
    }

    /// Union of every tracked file's set.
    pub fn all_live_identities(&self) -> BTreeSet<ClassIdentity> {
        self.files
            .read()
            .values()
            .flat_map(|set| set.iter().copied())
            .collect()
    }

    /// Tracked file ids, sorted.
    pub fn files(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}
