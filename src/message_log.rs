use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::surface::Surface;

/// How long a transient entry stays on screen unless cancelled earlier.
pub const DEFAULT_TRANSIENT_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug)]
struct LogEntry {
    id: u64,
    text: String,
}

#[derive(Debug, Default)]
struct LogState {
    next_id: u64,
    entries: Vec<LogEntry>,
}

/// Ordered status lines shown to the user.
///
/// Every push and every removal redraws the full log on the injected
/// [`Surface`]. Clones share the same entries.
#[derive(Clone)]
pub struct MessageLog {
    state: Arc<Mutex<LogState>>,
    surface: Arc<dyn Surface>,
    transient_ttl: Duration,
}

impl MessageLog {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LogState::default())),
            surface,
            transient_ttl: DEFAULT_TRANSIENT_TTL,
        }
    }

    pub fn with_transient_ttl(mut self, ttl: Duration) -> Self {
        self.transient_ttl = ttl;
        self
    }

    /// Append a line that stays until cancelled or cleared.
    pub fn push(&self, text: impl Into<String>) -> EntryHandle {
        self.push_entry(text.into())
    }

    /// Append a line that removes itself after the transient TTL.
    ///
    /// Must be called from within a tokio runtime; the expiry runs as a task.
    pub fn push_transient(&self, text: impl Into<String>) -> EntryHandle {
        let handle = self.push_entry(text.into());
        let expiry = handle.clone();
        let deadline = tokio::time::Instant::now() + self.transient_ttl;
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            expiry.cancel();
        });
        handle
    }

    /// Snapshot of the current lines, in push order.
    pub fn lines(&self) -> Vec<String> {
        self.state()
            .entries
            .iter()
            .map(|entry| entry.text.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    /// Remove every entry and redraw.
    pub fn clear(&self) {
        self.state().entries.clear();
        self.redraw();
    }

    /// Draw the current lines again without changing them.
    pub fn redraw(&self) {
        let lines = self.lines();
        self.surface.render(&lines);
    }

    fn push_entry(&self, text: String) -> EntryHandle {
        let id = {
            let mut state = self.state();
            let id = state.next_id;
            state.next_id += 1;
            state.entries.push(LogEntry { id, text });
            id
        };
        self.redraw();
        EntryHandle {
            log: self.clone(),
            id,
        }
    }

    fn remove(&self, id: u64) -> bool {
        let removed = {
            let mut state = self.state();
            match state.entries.iter().position(|entry| entry.id == id) {
                Some(index) => {
                    state.entries.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.redraw();
        }
        removed
    }

    fn contains(&self, id: u64) -> bool {
        self.state().entries.iter().any(|entry| entry.id == id)
    }

    fn state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes one entry from its log. Cancelling an entry that is already gone
/// does nothing.
#[derive(Clone)]
pub struct EntryHandle {
    log: MessageLog,
    id: u64,
}

impl EntryHandle {
    pub fn cancel(&self) {
        self.log.remove(self.id);
    }

    /// True while the entry is still in the log.
    pub fn is_live(&self) -> bool {
        self.log.contains(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    fn log() -> (MessageLog, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::new());
        (MessageLog::new(surface.clone()), surface)
    }

    #[test]
    fn test_push_appends_and_redraws() {
        let (log, surface) = log();
        log.push("first");
        log.push("second");

        assert_eq!(log.lines(), vec!["first", "second"]);
        assert_eq!(surface.render_count(), 2);
        assert_eq!(surface.frames()[0], vec!["first"]);
        assert_eq!(surface.last_frame(), vec!["first", "second"]);
    }

    #[test]
    fn test_cancel_removes_entry_and_redraws() {
        let (log, surface) = log();
        log.push("keep");
        let handle = log.push("drop");
        handle.cancel();

        assert_eq!(log.lines(), vec!["keep"]);
        assert!(!handle.is_live());
        assert_eq!(surface.render_count(), 3);
    }

    #[test]
    fn test_cancel_twice_is_noop() {
        let (log, surface) = log();
        let handle = log.push("once");
        handle.cancel();
        handle.cancel();

        assert!(log.is_empty());
        // push + one removal; the second cancel does not redraw.
        assert_eq!(surface.render_count(), 2);
    }

    #[test]
    fn test_duplicate_texts_are_separate_entries() {
        let (log, _surface) = log();
        let first = log.push("same");
        log.push("same");
        first.cancel();

        assert_eq!(log.lines(), vec!["same"]);
    }

    #[test]
    fn test_clear_empties_log() {
        let (log, surface) = log();
        let handle = log.push("a");
        log.push("b");
        log.clear();

        assert!(log.is_empty());
        assert!(surface.last_frame().is_empty());
        handle.cancel();
        assert_eq!(log.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_entry_expires_after_ttl() {
        let (log, surface) = log();
        log.push("persistent");
        let handle = log.push_transient("transient");
        assert_eq!(log.lines(), vec!["persistent", "transient"]);

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(handle.is_live());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!handle.is_live());
        assert_eq!(log.lines(), vec!["persistent"]);
        assert_eq!(surface.last_frame(), vec!["persistent"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_cancelled_early_then_expiry_is_noop() {
        let (log, surface) = log();
        let handle = log.push_transient("short");
        handle.cancel();
        let renders = surface.render_count();

        tokio::time::sleep(DEFAULT_TRANSIENT_TTL + Duration::from_millis(10)).await;
        handle.cancel();

        assert!(log.is_empty());
        assert_eq!(surface.render_count(), renders);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl() {
        let surface = Arc::new(MemorySurface::new());
        let log = MessageLog::new(surface).with_transient_ttl(Duration::from_millis(100));
        log.push_transient("quick");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(log.is_empty());
    }
}
