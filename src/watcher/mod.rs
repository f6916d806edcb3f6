pub mod event;

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::WatchError;
pub use event::{ChangeEvent, ChangeKind};

/// Events held between the OS watcher thread and the consumer. When full, the
/// watcher thread blocks until the consumer catches up.
const EVENT_BUFFER: usize = 64;

pub type EventResult = Result<ChangeEvent, WatchError>;

/// Handle to a running watcher. Dropping it (or calling [`stop`]) stops the
/// OS watcher, after which the paired [`EventStream`] ends.
///
/// [`stop`]: WatcherHandle::stop
pub struct WatcherHandle {
    watcher: Option<RecommendedWatcher>,
    directory: PathBuf,
}

impl WatcherHandle {
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            let _ = watcher.unwatch(&self.directory);
            tracing::debug!(directory = %self.directory.display(), "watcher stopped");
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Raw change events for one directory, in the order the OS reported them.
pub struct EventStream {
    rx: mpsc::Receiver<EventResult>,
}

impl EventStream {
    /// Next event, or `None` once the watcher has stopped.
    pub async fn next(&mut self) -> Option<EventResult> {
        self.rx.recv().await
    }
}

impl From<mpsc::Receiver<EventResult>> for EventStream {
    fn from(rx: mpsc::Receiver<EventResult>) -> Self {
        Self { rx }
    }
}

/// Start watching `directory` (non-recursively).
///
/// Every notification becomes one [`ChangeEvent`] per affected path. Nothing
/// is coalesced; the only event dropped is notify's paired rename, whose
/// names were already reported on their own. Backend errors arrive on the stream
/// as `Err` items. To restart, drop the handle and call this again.
pub fn start_watcher(directory: &Path) -> Result<(WatcherHandle, EventStream), WatchError> {
    let directory = std::fs::canonicalize(directory).map_err(|err| WatchError::Start {
        path: directory.to_path_buf(),
        source: notify::Error::io(err),
    })?;

    let (tx, rx) = mpsc::channel::<EventResult>(EVENT_BUFFER);

    let root = directory.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                for change in to_change_events(&event, &root) {
                    if tx.blocking_send(Ok(change)).is_err() {
                        return; // consumer gone
                    }
                }
            }
            Err(err) => {
                let _ = tx.blocking_send(Err(WatchError::Backend(err)));
            }
        }
    })
    .map_err(|source| WatchError::Start {
        path: directory.clone(),
        source,
    })?;

    watcher
        .watch(&directory, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Start {
            path: directory.clone(),
            source,
        })?;

    tracing::info!(directory = %directory.display(), "watching for changes");

    Ok((
        WatcherHandle {
            watcher: Some(watcher),
            directory,
        },
        EventStream { rx },
    ))
}

/// Map a notify event kind onto the coarse kinds the pipeline understands.
pub fn classify(kind: &EventKind) -> ChangeKind {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => {
            ChangeKind::Rename
        }
        EventKind::Modify(_) => ChangeKind::Modify,
        _ => ChangeKind::Other,
    }
}

fn to_change_events(event: &notify::Event, directory: &Path) -> Vec<ChangeEvent> {
    // notify pairs a From and a To into an extra Both event; each name was
    // already reported once.
    if event.kind == EventKind::Modify(ModifyKind::Name(RenameMode::Both)) {
        return Vec::new();
    }
    let kind = classify(&event.kind);
    event
        .paths
        .iter()
        .filter_map(|path| relative_name(path, directory))
        .map(|filename| ChangeEvent::new(kind, filename))
        .collect()
}

/// Name of `path` relative to the watched directory; `None` for the
/// directory itself.
fn relative_name(path: &Path, directory: &Path) -> Option<String> {
    let relative = match path.strip_prefix(directory) {
        Ok(rel) => rel,
        Err(_) => Path::new(path.file_name()?),
    };
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(relative.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};
    use std::time::Duration;

    #[test]
    fn test_classify_name_changes_as_rename() {
        assert_eq!(
            classify(&EventKind::Create(CreateKind::File)),
            ChangeKind::Rename
        );
        assert_eq!(
            classify(&EventKind::Remove(RemoveKind::File)),
            ChangeKind::Rename
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            ChangeKind::Rename
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            ChangeKind::Rename
        );
    }

    #[test]
    fn test_classify_content_changes_as_modify() {
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            ChangeKind::Modify
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            ChangeKind::Modify
        );
        assert_eq!(classify(&EventKind::Modify(ModifyKind::Any)), ChangeKind::Modify);
    }

    #[test]
    fn test_classify_everything_else_as_other() {
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Any)),
            ChangeKind::Other
        );
        assert_eq!(classify(&EventKind::Any), ChangeKind::Other);
        assert_eq!(classify(&EventKind::Other), ChangeKind::Other);
    }

    #[test]
    fn test_paired_rename_event_is_skipped() {
        let dir = Path::new("/watched");
        let from = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(dir.join("x.pdf.part"));
        let to = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(dir.join("x.pdf"));
        let both = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(dir.join("x.pdf.part"))
            .add_path(dir.join("x.pdf"));

        let events: Vec<ChangeEvent> = [from, to, both]
            .iter()
            .flat_map(|event| to_change_events(event, dir))
            .collect();
        assert_eq!(
            events,
            vec![ChangeEvent::rename("x.pdf.part"), ChangeEvent::rename("x.pdf")]
        );
    }

    #[test]
    fn test_directory_itself_is_skipped() {
        let dir = Path::new("/watched");
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Any)).add_path(dir.to_path_buf());
        assert!(to_change_events(&event, dir).is_empty());
    }

    #[test]
    fn test_foreign_path_falls_back_to_file_name() {
        assert_eq!(
            relative_name(Path::new("/private/watched/a.pdf"), Path::new("/watched")),
            Some("a.pdf".to_string())
        );
    }

    #[test]
    fn test_start_on_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            start_watcher(&missing),
            Err(WatchError::Start { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_new_file_produces_rename_event() {
        let dir = tempfile::tempdir().unwrap();
        let (_handle, mut events) = start_watcher(dir.path()).unwrap();

        std::fs::write(dir.path().join("fresh.pdf"), b"%PDF").unwrap();

        let found = tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(item) = events.next().await {
                let event = item.expect("watch error");
                if event.filename == "fresh.pdf" && event.kind == ChangeKind::Rename {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        assert!(found, "expected a rename-class event for fresh.pdf");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rename_within_directory_reports_new_name_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.pdf.part"), b"%PDF").unwrap();
        let (_handle, mut events) = start_watcher(dir.path()).unwrap();

        std::fs::rename(dir.path().join("x.pdf.part"), dir.path().join("x.pdf")).unwrap();
        // A later marker file bounds the burst produced by the rename.
        std::fs::write(dir.path().join("done.txt"), b"").unwrap();

        let seen = tokio::time::timeout(Duration::from_secs(10), async {
            let mut seen = Vec::new();
            while let Some(item) = events.next().await {
                let event = item.expect("watch error");
                if event.filename == "done.txt" {
                    break;
                }
                seen.push(event);
            }
            seen
        })
        .await
        .expect("marker event should arrive");

        let renamed = seen
            .iter()
            .filter(|event| event.filename == "x.pdf" && event.kind == ChangeKind::Rename)
            .count();
        assert_eq!(renamed, 1, "events: {seen:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stream_ends_after_stop() {
        let dir = tempfile::tempdir().unwrap();
        let (mut handle, mut events) = start_watcher(dir.path()).unwrap();
        handle.stop();
        assert!(!handle.is_running());

        let ended = tokio::time::timeout(Duration::from_secs(10), async {
            while events.next().await.is_some() {}
        })
        .await;
        assert!(ended.is_ok(), "stream should end once the watcher is dropped");
    }
}
