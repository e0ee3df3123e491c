//! Persisted per-plugin enable/disable state.
//!
//! The enablement record is one flat JSON map from plugin id to boolean,
//! owned by the settings surface; this subsystem only reads it. A missing
//! record, a missing key, or an unreadable record all degrade to the
//! configured fail policy (enabled by default) so command suggestions never
//! block on storage.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::error::EnablementError;
use crate::persistence;

/// File name of the persisted enablement record under the data directory.
pub const ENABLEMENT_FILE: &str = "plugins_enabled.json";

/// What to assume about a plugin that has no entry in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailPolicy {
    /// Absent or unreadable state means enabled.
    #[default]
    Open,
    /// Absent or unreadable state means disabled.
    Closed,
}

/// An immutable snapshot of plugin enablement, as of one read.
#[derive(Debug, Clone, Default)]
pub struct EnablementSnapshot {
    states: HashMap<String, bool>,
    policy: FailPolicy,
}

impl EnablementSnapshot {
    pub fn new(states: HashMap<String, bool>, policy: FailPolicy) -> Self {
        Self { states, policy }
    }

    /// The snapshot used when the record cannot be read: every plugin
    /// falls through to the policy default.
    pub fn empty(policy: FailPolicy) -> Self {
        Self {
            states: HashMap::new(),
            policy,
        }
    }

    /// Whether the given plugin is enabled in this snapshot.
    pub fn is_enabled(&self, plugin_id: &str) -> bool {
        match self.states.get(plugin_id) {
            Some(&enabled) => enabled,
            None => self.policy == FailPolicy::Open,
        }
    }

    pub fn policy(&self) -> FailPolicy {
        self.policy
    }
}

/// Source of enablement snapshots.
///
/// `snapshot()` is the one async boundary of the suggestion pipeline; it
/// must never fail outward. Implementations recover from storage errors
/// internally and return a snapshot that applies the fail policy.
#[async_trait]
pub trait EnablementSource: Send + Sync {
    async fn snapshot(&self) -> EnablementSnapshot;

    /// Drop any cached state so the next snapshot re-reads storage.
    async fn invalidate(&self) {}
}

/// Reads the enablement record from a JSON file, caching the snapshot for
/// the lifetime of one suggestion session. Staleness past `invalidate()`
/// is acceptable; enablement edits take effect the next time the surface
/// opens.
pub struct FileEnablementStore {
    path: PathBuf,
    policy: FailPolicy,
    cached: Mutex<Option<EnablementSnapshot>>,
}

impl FileEnablementStore {
    /// Store reading `plugins_enabled.json` under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, policy: FailPolicy) -> Self {
        Self {
            path: data_dir.into().join(ENABLEMENT_FILE),
            policy,
            cached: Mutex::new(None),
        }
    }

    fn read(&self) -> EnablementSnapshot {
        match self.try_read() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to read plugin enablement record, applying fail policy"
                );
                EnablementSnapshot::empty(self.policy)
            }
        }
    }

    fn try_read(&self) -> Result<EnablementSnapshot, EnablementError> {
        match persistence::load_json::<HashMap<String, bool>>(&self.path) {
            Ok(Some(states)) => Ok(EnablementSnapshot::new(states, self.policy)),
            Ok(None) => Ok(EnablementSnapshot::empty(self.policy)),
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                Err(EnablementError::Corrupt {
                    message: err.to_string(),
                })
            }
            Err(err) => Err(EnablementError::Io(err)),
        }
    }
}

#[async_trait]
impl EnablementSource for FileEnablementStore {
    async fn snapshot(&self) -> EnablementSnapshot {
        let mut cached = self.cached.lock().await;
        if let Some(snapshot) = cached.as_ref() {
            return snapshot.clone();
        }
        let snapshot = self.read();
        *cached = Some(snapshot.clone());
        snapshot
    }

    async fn invalidate(&self) {
        self.cached.lock().await.take();
    }
}

/// Fixed in-memory enablement, for tests and session overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticEnablement {
    snapshot: EnablementSnapshot,
}

impl StaticEnablement {
    pub fn new(states: HashMap<String, bool>, policy: FailPolicy) -> Self {
        Self {
            snapshot: EnablementSnapshot::new(states, policy),
        }
    }

    /// Everything enabled (the fail-open default with an empty record).
    pub fn all_enabled() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnablementSource for StaticEnablement {
    async fn snapshot(&self) -> EnablementSnapshot {
        self.snapshot.clone()
    }
}

/// Wraps another source and forces a set of plugins off for this session,
/// without touching the persisted record.
pub struct DisabledOverlay<S> {
    inner: S,
    disabled: HashSet<String>,
}

impl<S: EnablementSource> DisabledOverlay<S> {
    pub fn new(inner: S, disabled: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner,
            disabled: disabled.into_iter().collect(),
        }
    }
}

#[async_trait]
impl<S: EnablementSource> EnablementSource for DisabledOverlay<S> {
    async fn snapshot(&self) -> EnablementSnapshot {
        let base = self.inner.snapshot().await;
        let mut states = base.states;
        for plugin_id in &self.disabled {
            states.insert(plugin_id.clone(), false);
        }
        EnablementSnapshot::new(states, base.policy)
    }

    async fn invalidate(&self) {
        self.inner.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn states(entries: &[(&str, bool)]) -> HashMap<String, bool> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_fail_open_default_for_absent_plugin() {
        let snapshot = EnablementSnapshot::new(states(&[("timetable", false)]), FailPolicy::Open);
        assert!(!snapshot.is_enabled("timetable"));
        assert!(snapshot.is_enabled("score"));
    }

    #[test]
    fn test_fail_closed_hides_absent_plugin() {
        let snapshot = EnablementSnapshot::new(states(&[("score", true)]), FailPolicy::Closed);
        assert!(snapshot.is_enabled("score"));
        assert!(!snapshot.is_enabled("timetable"));
    }

    #[tokio::test]
    async fn test_file_store_missing_record_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileEnablementStore::new(dir.path(), FailPolicy::Open);
        let snapshot = store.snapshot().await;
        assert!(snapshot.is_enabled("anything"));
    }

    #[tokio::test]
    async fn test_file_store_reads_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ENABLEMENT_FILE);
        persistence::atomic_write_json(&path, &states(&[("timetable", false)])).unwrap();

        let store = FileEnablementStore::new(dir.path(), FailPolicy::Open);
        let snapshot = store.snapshot().await;
        assert!(!snapshot.is_enabled("timetable"));
        assert!(snapshot.is_enabled("documents"));
    }

    #[tokio::test]
    async fn test_file_store_corrupt_record_applies_policy() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(ENABLEMENT_FILE), "{broken").unwrap();

        let open = FileEnablementStore::new(dir.path(), FailPolicy::Open);
        assert!(open.snapshot().await.is_enabled("timetable"));

        let closed = FileEnablementStore::new(dir.path(), FailPolicy::Closed);
        assert!(!closed.snapshot().await.is_enabled("timetable"));
    }

    #[tokio::test]
    async fn test_file_store_caches_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ENABLEMENT_FILE);
        let store = FileEnablementStore::new(dir.path(), FailPolicy::Open);

        assert!(store.snapshot().await.is_enabled("timetable"));

        persistence::atomic_write_json(&path, &states(&[("timetable", false)])).unwrap();
        // Cached snapshot still reports the old state.
        assert!(store.snapshot().await.is_enabled("timetable"));

        store.invalidate().await;
        assert!(!store.snapshot().await.is_enabled("timetable"));
    }

    #[tokio::test]
    async fn test_disabled_overlay_forces_off() {
        let base = StaticEnablement::new(states(&[("score", true)]), FailPolicy::Open);
        let overlay = DisabledOverlay::new(base, vec!["score".to_string()]);
        let snapshot = overlay.snapshot().await;
        assert!(!snapshot.is_enabled("score"));
        assert!(snapshot.is_enabled("documents"));
    }
}
