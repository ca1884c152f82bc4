use crate::error::Result;
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Store key holding the persisted queue. Targets and cursor live in one
/// record so each mutation is a single write.
pub const QUEUE_KEY: &str = "harvest.navigation_queue";

/// Absolute URL of a company profile page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyTarget(String);

impl CompanyTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CompanyTarget {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl From<&str> for CompanyTarget {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

/// Persisted traversal state as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub targets: Vec<CompanyTarget>,
    pub cursor: usize,
}

impl QueueSnapshot {
    pub fn current(&self) -> Option<&CompanyTarget> {
        self.targets.get(self.cursor)
    }

    pub fn remaining(&self) -> usize {
        self.targets.len().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.targets.len()
    }
}

/// Ordered company targets plus the index of the next one to visit.
///
/// The cursor only moves forward. Once it reaches the end the record is
/// deleted, so a later directory visit starts a fresh traversal.
pub struct NavigationQueue<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> NavigationQueue<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Replace any persisted queue with `targets` and rewind the cursor.
    /// Returns the first target, or `None` without touching the store when
    /// `targets` is empty.
    pub fn seed_from_directory(&self, targets: Vec<CompanyTarget>) -> Result<Option<CompanyTarget>> {
        let Some(first) = targets.first().cloned() else {
            debug!("No company targets found; queue left untouched");
            return Ok(None);
        };

        let snapshot = QueueSnapshot { targets, cursor: 0 };
        self.persist(&snapshot)?;
        info!("Stored {} company profile URLs", snapshot.targets.len());
        Ok(Some(first))
    }

    pub fn current_target(&self) -> Result<Option<CompanyTarget>> {
        Ok(self
            .snapshot()?
            .and_then(|snapshot| snapshot.current().cloned()))
    }

    /// Move the cursor past the current target. Returns the new current
    /// target; `None` means the traversal is complete and the queue is gone.
    pub fn advance(&self) -> Result<Option<CompanyTarget>> {
        let Some(mut snapshot) = self.snapshot()? else {
            return Ok(None);
        };

        snapshot.cursor += 1;
        if snapshot.is_exhausted() {
            self.clear()?;
            info!("Finished visiting all {} company profiles", snapshot.targets.len());
            return Ok(None);
        }

        self.persist(&snapshot)?;
        Ok(snapshot.current().cloned())
    }

    pub fn snapshot(&self) -> Result<Option<QueueSnapshot>> {
        match self.store.get(QUEUE_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.delete(QUEUE_KEY)
    }

    fn persist(&self, snapshot: &QueueSnapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        self.store.set(QUEUE_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_snapshot_helpers() {
        let snapshot = QueueSnapshot {
            targets: vec!["https://a".into(), "https://b".into()],
            cursor: 1,
        };
        assert_eq!(snapshot.current().map(|t| t.as_str()), Some("https://b"));
        assert_eq!(snapshot.remaining(), 1);
        assert!(!snapshot.is_exhausted());
    }

    #[test]
    fn test_targets_serialize_as_plain_strings() {
        let snapshot = QueueSnapshot {
            targets: vec!["https://a".into()],
            cursor: 0,
        };
        let raw = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(raw, r#"{"targets":["https://a"],"cursor":0}"#);
    }

    #[test]
    fn test_advance_without_queue_is_noop() {
        let store = MemoryStore::new();
        let queue = NavigationQueue::new(&store);

        assert_eq!(queue.advance().unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let store = MemoryStore::new();
        store.set(QUEUE_KEY, "not json").unwrap();

        let queue = NavigationQueue::new(&store);
        assert!(queue.current_target().is_err());
    }
}
