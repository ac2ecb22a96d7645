//! Auto-save, crash recovery and document properties for the open document

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::document::DocumentFormat;
use super::properties::{self, PropertySet, PropertyValue};
use super::recovery;
use super::schedule::IntervalTask;
use super::text_document::{SharedDocument, TextDocument};

/// Default time between recovery snapshots
pub const AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// The document currently being auto-saved
struct ActiveDocument {
    document: SharedDocument,
    path: PathBuf,
    /// Revision captured by the last successful snapshot
    snapshot_revision: Option<u64>,
}

/// Recovery and properties store.
///
/// Holds at most one active document. While active, [`DocumentManager::poll`]
/// writes a snapshot of it every interval, and property mutations are
/// persisted next to the document straight away. None of the public
/// operations fail loudly: errors are logged and reported as `false` or an
/// empty result.
pub struct DocumentManager {
    recovery_dir: PathBuf,
    task: IntervalTask,
    active: Option<ActiveDocument>,
    properties: PropertySet,
}

impl DocumentManager {
    #[cfg(test)]
    pub fn new(recovery_dir: PathBuf) -> Self {
        Self::with_interval(recovery_dir, AUTO_SAVE_INTERVAL)
    }

    pub fn with_interval(recovery_dir: PathBuf, interval: Duration) -> Self {
        Self {
            recovery_dir,
            task: IntervalTask::new(interval),
            active: None,
            properties: PropertySet::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.task.interval()
    }

    /// Start auto-saving `document` under `path`, replacing any previous document
    pub fn begin(&mut self, document: SharedDocument, path: &Path) {
        self.end();

        if path.as_os_str().is_empty() {
            return;
        }

        self.active = Some(ActiveDocument {
            document,
            path: path.to_path_buf(),
            snapshot_revision: None,
        });
        self.reload_properties(path);
        self.task.start(Instant::now());

        tracing::info!(
            "Auto-save started for {} every {}s",
            path.display(),
            self.task.interval().as_secs()
        );
    }

    /// Stop auto-saving and forget the active document
    pub fn end(&mut self) {
        self.task.cancel();
        if let Some(active) = self.active.take() {
            tracing::debug!("Auto-save stopped for {}", active.path.display());
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    pub fn has_recovery_snapshot(&self, path: &Path) -> bool {
        recovery::snapshot_path(&self.recovery_dir, path).exists()
    }

    /// Load the snapshot for `path` into `document`, then reload its properties.
    ///
    /// Returns false, leaving the document untouched, when there is no
    /// readable snapshot.
    pub fn recover(&mut self, document: &mut dyn TextDocument, path: &Path) -> bool {
        if !self.has_recovery_snapshot(path) {
            return false;
        }

        let content = match recovery::read_snapshot(&self.recovery_dir, path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read recovery snapshot: {}", e);
                return false;
            }
        };

        if DocumentFormat::from_path(path).is_plain() {
            document.set_plain_text(&content);
        } else {
            document.set_rich_markup(&content);
        }
        self.reload_properties(path);

        tracing::info!("Recovered {} from snapshot", path.display());
        true
    }

    pub fn clear_recovery_snapshot(&self, path: &Path) {
        if let Err(e) = recovery::remove_snapshot(&self.recovery_dir, path) {
            tracing::warn!("Failed to remove recovery snapshot: {}", e);
        }
    }

    /// Document paths that still have a snapshot on disk
    pub fn pending_recovery_snapshots(&self) -> Vec<PathBuf> {
        recovery::list_snapshots(&self.recovery_dir)
    }

    /// Set a property; returns whether the property file is up to date
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> bool {
        self.properties.insert(key.into(), value.into());
        self.persist_properties()
    }

    /// Remove one property; returns whether the property file is up to date
    pub fn remove_property(&mut self, key: &str) -> bool {
        if self.properties.remove(key).is_none() {
            return true;
        }
        self.persist_properties()
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn all_properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Drop every property and delete the property file
    pub fn clear_properties(&mut self) -> bool {
        self.properties.clear();
        self.persist_properties()
    }

    /// Run the periodic snapshot if it is due. Returns the file written.
    pub fn poll(&mut self, now: Instant) -> Option<PathBuf> {
        if !self.task.fire_if_due(now) {
            return None;
        }
        self.snapshot(false)
    }

    /// Write a snapshot right away, even if the content has not changed
    pub fn snapshot_now(&mut self) -> Option<PathBuf> {
        self.snapshot(true)
    }

    /// Time until the next periodic snapshot, `None` when idle
    pub fn time_until_next_snapshot(&self, now: Instant) -> Option<Duration> {
        self.task.remaining(now)
    }

    fn snapshot(&mut self, force: bool) -> Option<PathBuf> {
        let active = self.active.as_mut()?;

        // Copy the content out so the borrow ends before any file I/O
        let (revision, content) = {
            let document = match active.document.try_borrow() {
                Ok(document) => document,
                Err(_) => {
                    tracing::warn!("Document busy, skipping recovery snapshot");
                    return None;
                }
            };
            let revision = document.revision();
            if !force && active.snapshot_revision == Some(revision) {
                return None;
            }
            let content = if DocumentFormat::from_path(&active.path).is_plain() {
                document.plain_text()
            } else {
                document.rich_markup()
            };
            (revision, content)
        };

        match recovery::write_snapshot(&self.recovery_dir, &active.path, &content) {
            Ok(written) => {
                active.snapshot_revision = Some(revision);
                tracing::debug!("Wrote recovery snapshot {}", written.display());
                Some(written)
            }
            Err(e) => {
                tracing::warn!("Recovery snapshot failed: {}", e);
                None
            }
        }
    }

    fn reload_properties(&mut self, path: &Path) {
        let file = properties::properties_path(path);
        self.properties = match properties::load(&file) {
            Ok(properties) => properties,
            Err(e) => {
                tracing::warn!("Ignoring document properties: {}", e);
                PropertySet::new()
            }
        };
    }

    fn persist_properties(&self) -> bool {
        let Some(active) = self.active.as_ref() else {
            return true;
        };

        let file = properties::properties_path(&active.path);
        match properties::save(&file, &self.properties) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to save document properties: {}", e);
                false
            }
        }
    }
}

impl Drop for DocumentManager {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    use super::*;
    use crate::core::document::EditorBuffer;

    fn shared(content: &str) -> Rc<RefCell<EditorBuffer>> {
        let mut buffer = EditorBuffer::untitled();
        buffer.set_content(content.to_string());
        Rc::new(RefCell::new(buffer))
    }

    fn after_interval(manager: &DocumentManager) -> Instant {
        Instant::now() + manager.interval() + Duration::from_secs(1)
    }

    #[test]
    fn test_snapshot_after_one_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        let doc = shared("quarterly numbers");
        let path = Path::new("/tmp/report.txt");

        manager.begin(doc.clone(), path);
        assert!(!manager.has_recovery_snapshot(path));
        assert_eq!(manager.poll(Instant::now()), None);

        let written = manager.poll(after_interval(&manager)).unwrap();
        assert_eq!(written, dir.path().join("recovery").join("_tmp_report.txt.recovery"));
        assert_eq!(fs::read_to_string(&written).unwrap(), "quarterly numbers");
        assert!(manager.has_recovery_snapshot(path));

        manager.clear_recovery_snapshot(path);
        assert!(!manager.has_recovery_snapshot(path));
    }

    #[test]
    fn test_rich_documents_snapshot_markup() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        let doc = shared("hello");
        let path = dir.path().join("letter.html");

        manager.begin(doc, &path);
        let written = manager.poll(after_interval(&manager)).unwrap();
        let content = fs::read_to_string(written).unwrap();
        assert!(content.contains("<p>hello</p>"));
    }

    #[test]
    fn test_switching_documents_stops_old_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        let first_doc = shared("one");

        manager.begin(first_doc.clone(), &first);
        let first_snapshot = manager.poll(after_interval(&manager)).unwrap();
        assert_eq!(fs::read_to_string(&first_snapshot).unwrap(), "one");

        manager.begin(shared("two"), &second);
        assert_eq!(manager.active_path(), Some(second.as_path()));

        first_doc.borrow_mut().set_content("one, edited".to_string());
        let written = manager.poll(after_interval(&manager)).unwrap();

        assert_eq!(written, recovery::snapshot_path(&dir.path().join("recovery"), &second));
        assert_eq!(fs::read_to_string(&first_snapshot).unwrap(), "one");
        assert_eq!(manager.snapshot_now(), Some(written));
        assert_eq!(fs::read_to_string(&first_snapshot).unwrap(), "one");
    }

    #[test]
    fn test_end_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        let path = dir.path().join("a.txt");

        manager.begin(shared("x"), &path);
        manager.end();
        manager.end();

        assert!(!manager.is_active());
        assert_eq!(manager.poll(after_interval(&manager)), None);
        assert_eq!(manager.time_until_next_snapshot(Instant::now()), None);
    }

    #[test]
    fn test_empty_path_stays_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DocumentManager::new(dir.path().join("recovery"));

        manager.begin(shared("x"), Path::new(""));
        assert!(!manager.is_active());
        assert_eq!(manager.snapshot_now(), None);
    }

    #[test]
    fn test_unchanged_document_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        let doc = shared("v1");
        let path = dir.path().join("a.txt");

        manager.begin(doc.clone(), &path);
        let first_tick = after_interval(&manager);
        assert!(manager.poll(first_tick).is_some());

        let second_tick = first_tick + manager.interval();
        assert_eq!(manager.poll(second_tick), None);

        doc.borrow_mut().set_content("v2".to_string());
        let third_tick = second_tick + manager.interval();
        let written = manager.poll(third_tick).unwrap();
        assert_eq!(fs::read_to_string(written).unwrap(), "v2");
    }

    #[test]
    fn test_write_failure_keeps_task_running() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the recovery directory should be
        let blocker = dir.path().join("recovery");
        fs::write(&blocker, "").unwrap();

        let mut manager = DocumentManager::new(blocker);
        let path = dir.path().join("a.txt");
        manager.begin(shared("x"), &path);

        assert_eq!(manager.poll(after_interval(&manager)), None);
        assert!(manager.time_until_next_snapshot(Instant::now()).is_some());
    }

    #[test]
    fn test_recover_without_snapshot_leaves_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        let mut buffer = EditorBuffer::untitled();
        buffer.set_content("untouched".to_string());
        let revision = buffer.revision();

        assert!(!manager.recover(&mut buffer, &dir.path().join("missing.txt")));
        assert_eq!(buffer.content, "untouched");
        assert_eq!(buffer.revision(), revision);
    }

    #[test]
    fn test_recover_restores_content_and_properties() {
        let dir = tempfile::tempdir().unwrap();
        let recovery_dir = dir.path().join("recovery");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "saved").unwrap();

        {
            let mut manager = DocumentManager::new(recovery_dir.clone());
            let doc = shared("unsaved work");
            manager.begin(doc, &path);
            manager.set_property("Author", "Alice");
            manager.snapshot_now().unwrap();
        }

        let mut manager = DocumentManager::new(recovery_dir);
        assert_eq!(manager.pending_recovery_snapshots(), vec![path.clone()]);

        let mut buffer = EditorBuffer::open(&path).unwrap();
        assert!(manager.recover(&mut buffer, &path));
        assert_eq!(buffer.content, "unsaved work");
        assert!(buffer.modified);
        assert_eq!(manager.property("Author"), Some(&PropertyValue::from("Alice")));
    }

    #[test]
    fn test_property_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        manager.begin(shared(""), &path);
        assert!(manager.set_property("Author", "Alice"));
        manager.end();

        let mut reloaded = DocumentManager::new(dir.path().join("recovery"));
        reloaded.begin(shared(""), &path);
        assert_eq!(reloaded.property("Author"), Some(&PropertyValue::from("Alice")));
    }

    #[test]
    fn test_clear_properties_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let meta = dir.path().join("report.meta");

        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        manager.begin(shared(""), &path);
        manager.set_property("Author", "Alice");
        manager.set_property("Revision", 3i64);

        let all = manager.all_properties();
        assert_eq!(all.len(), 2);
        assert_eq!(all["Author"], PropertyValue::from("Alice"));
        assert_eq!(all["Revision"], PropertyValue::Integer(3));
        assert!(meta.exists());

        assert!(manager.clear_properties());
        assert!(manager.all_properties().is_empty());
        assert!(!meta.exists());
    }

    #[test]
    fn test_malformed_properties_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        fs::write(dir.path().join("report.meta"), "{ broken").unwrap();

        let mut manager = DocumentManager::new(dir.path().join("recovery"));
        manager.begin(shared(""), &path);
        assert!(manager.all_properties().is_empty());
    }

    #[test]
    fn test_properties_without_document_stay_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DocumentManager::new(dir.path().join("recovery"));

        assert!(manager.set_property("Title", "Draft"));
        assert_eq!(manager.property("Title"), Some(&PropertyValue::from("Draft")));
        assert!(manager.remove_property("Title"));
        assert_eq!(manager.property("Title"), None);
    }
}
